use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser};

use crate::data::loader::DEFAULT_SHEET;
use crate::pipeline::Pipeline;

/// Default location of the project sheet, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "cleaned_project_data.xlsx";

/// Where the project data lives. Shared by every binary.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct DataSource {
    /// Spreadsheet (.xlsx/.xls/.ods), .csv, .json or .parquet file to load
    #[arg(long = "data", env = "DASHBOARD_DATA", default_value = DEFAULT_DATA_PATH)]
    pub path: PathBuf,

    /// Worksheet to read from spreadsheet files
    #[arg(long, env = "DASHBOARD_SHEET", default_value = DEFAULT_SHEET)]
    pub sheet: String,
}

impl DataSource {
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.path.clone(), self.sheet.clone())
    }
}

/// Desktop dashboard.
#[derive(Debug, Parser)]
#[command(name = "project-dashboard", version, about = "Project Performance Dashboard")]
pub struct DesktopConfig {
    #[command(flatten)]
    pub source: DataSource,
}

/// HTTP dashboard endpoint.
#[derive(Debug, Parser)]
#[command(name = "dashboard-server", version, about = "Serve dashboard views as JSON")]
pub struct ServerConfig {
    #[command(flatten)]
    pub source: DataSource,

    /// Address to listen on
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_cleaned_sheet() {
        let cfg = DesktopConfig::try_parse_from(["project-dashboard"]).unwrap();
        assert_eq!(cfg.source.path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(cfg.source.sheet, "Cleaned Data");
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::try_parse_from([
            "dashboard-server",
            "--data",
            "other.csv",
            "--sheet",
            "Raw",
            "--addr",
            "0.0.0.0:8080",
        ])
        .unwrap();
        assert_eq!(cfg.source.path, PathBuf::from("other.csv"));
        assert_eq!(cfg.source.sheet, "Raw");
        assert_eq!(cfg.addr.port(), 8080);
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(ServerConfig::try_parse_from(["dashboard-server", "--addr", "nowhere"]).is_err());
    }
}
