use crate::config::toml_config::AppConfig;
use crate::core::service::DeletePolicy;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "front-desk")]
#[command(about = "Hotel, customer and reservation records kept in JSON files")]
pub struct CliConfig {
    #[arg(long, default_value = "front-desk.toml", help = "Path to TOML configuration file")]
    pub config: String,

    #[arg(long, help = "Directory holding the JSON stores (overrides the config file)")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Cancel active reservations when deleting their hotel or customer")]
    pub cascade_delete: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if self.cascade_delete {
            config.policy.on_delete = DeletePolicy::CascadeCancel;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage hotels
    #[command(subcommand)]
    Hotel(HotelCommand),

    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Manage reservations
    #[command(subcommand)]
    Reservation(ReservationCommand),

    /// List rooms of a hotel that are free for a date range
    Availability {
        hotel_id: String,
        start: String,
        end: String,
    },

    /// Load every store and report malformed records
    Check,

    /// Read commands from standard input until `exit`
    Shell,
}

#[derive(Debug, Clone, Subcommand)]
pub enum HotelCommand {
    Create {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        rooms: u32,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        rooms: Option<u32>,
    },
    Delete {
        id: String,
    },
    Show {
        id: String,
    },
    List,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CustomerCommand {
    Create {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    Delete {
        id: String,
    },
    Show {
        id: String,
    },
    List,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReservationCommand {
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        hotel: String,
        #[arg(long)]
        room: u32,
        #[arg(long, help = "Check-in date (YYYY-MM-DD)")]
        start: String,
        #[arg(long, help = "Check-out date (YYYY-MM-DD)")]
        end: String,
    },
    Cancel {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        room: u32,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    Show {
        id: String,
    },
    List,
}

/// One line typed into the interactive shell.
#[derive(Debug, Parser)]
#[command(name = "front-desk", no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}
