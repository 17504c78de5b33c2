//! Entry point for the climfix application.
//! Handles CLI parsing, builds the run configuration, and processes each
//! configured variable in order.

use clap::Parser;
use climfix::cli::Args;
use climfix::process::run;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
             _____ _ _           ______ _
            /  __ \ (_)          |  ___(_)
            | /  \/ |_ _ __ ___  | |_   ___  __
            | |   | | | '_ ` _ \ |  _| | \ \/ /
            | \__/\ | | | | | | || |   | |>  <
             \____/_|_|_| |_| |_|\_|   |_/_/\_\
                  Monthly climate file normalizer
------------------------------------------------------------------
        "#
    );

    let config = args.to_config();

    if args.verbose {
        println!("Input folder:    {}", config.input_folder.display());
        println!("Variables:       {}", config.variables.join(", "));
        println!("Rounding digits: {}", config.digits);
        println!("Output suffix:   {}", config.output_suffix);
        println!();
    }

    let written = run(&config)?;

    println!("\n🎉 Normalized {} variable(s)", written.len());
    Ok(())
}
