// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sortwatch validate` command - Validate configuration file.

use sortwatch_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Server:");
            println!("  Listen:          {}:{}", config.server.bind, config.server.port);
            match config.server.prometheus_port {
                Some(port) => println!("  Prometheus Port: {}", port),
                None => println!("  Prometheus Port: disabled"),
            }
            println!();
            println!("Telemetry:");
            println!(
                "  Data Directory:  {}",
                config.telemetry.data_dir.display()
            );
            println!("  Request Log:     {}", config.telemetry.request_log);
            println!("  Host Log:        {}", config.telemetry.host_log);
            println!();
            println!("Sampler:");
            println!("  Strategy:        {}", config.sampler.strategy);
            if let Some(command) = &config.sampler.command {
                println!("  Command:         {}", command.join(" "));
            }
            println!();
            println!("Principals ({}):", config.tokens.len());
            for entry in &config.tokens {
                println!("  - {}", entry.principal);
            }
            if !config.items.is_empty() {
                println!();
                println!("Seed Items ({}):", config.items.len());
                for item in &config.items {
                    println!("  - {} = {}", item.name, item.value);
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
