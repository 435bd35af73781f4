use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "rgbw-bridge")]
#[command(about = "MQTT bridge exposing Razumdom RGBW dimmers as JSON lights")]
pub struct CliConfig {
    #[arg(long, default_value = "bridge.toml")]
    pub config: String,

    #[arg(long, help = "Override the MQTT broker host from the config file")]
    pub broker_host: Option<String>,

    #[arg(long, help = "Override the MQTT broker port from the config file")]
    pub broker_port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,

    #[arg(long, help = "Validate the configuration, print a summary and exit")]
    pub dry_run: bool,
}
