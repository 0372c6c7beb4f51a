//! Dumps the decodable members of an extracted replay as JSON.
//!
//! ```text
//! replay-dump <protocol.py> <member-dir> [--supplemental <file>]
//! ```
//!
//! `<member-dir>` holds one file per archive member, named after it
//! (`replay.details`, `replay.tracker.events`, ...), plus the user-data
//! block in `replay.userdata`. Set `RUST_LOG=debug` for decoder logs.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use replaycodec::prelude::*;
use serde_json::Value as Json;

/// File holding the user-data block, preamble already stripped.
const USER_DATA_FILE: &str = "replay.userdata";

#[derive(Parser)]
#[command(name = "replay-dump", about = "Dump the members of an extracted replay as JSON")]
struct Cli {
    /// Protocol schema source module
    schema: PathBuf,

    /// Directory with one file per archive member
    members: PathBuf,

    /// Supplemental JSON merged over the schema document
    #[arg(short, long)]
    supplemental: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Directory archive
// ---------------------------------------------------------------------------

struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    fn read(&self, name: &str) -> Result<Vec<u8>, std::io::Error> {
        fs::read(self.root.join(name))
    }
}

impl ReplayArchive for DirArchive {
    fn user_data(&self) -> Result<Cow<'_, [u8]>, ArchiveError> {
        match self.read(USER_DATA_FILE) {
            Ok(data) => Ok(Cow::Owned(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::MissingUserData)
            }
            Err(source) => Err(ArchiveError::Io {
                member: USER_DATA_FILE.into(),
                source,
            }),
        }
    }

    fn read_member(&self, name: &str) -> Result<Cow<'_, [u8]>, ArchiveError> {
        match self.read(name) {
            Ok(data) => Ok(Cow::Owned(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::MissingMember(name.into()))
            }
            Err(source) => Err(ArchiveError::Io {
                member: name.into(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = ProtocolContext::builder().schema_source(fs::read_to_string(&cli.schema)?);
    if let Some(supplemental) = &cli.supplemental {
        builder = builder.supplemental_json(fs::read_to_string(supplemental)?);
    }
    let ctx = builder.build()?;
    tracing::info!(schema = %cli.schema.display(), types = ctx.types().len(), "protocol loaded");

    let archive = DirArchive { root: cli.members };
    let replay = Replay::new(&ctx, archive);

    let mut out = BTreeMap::new();
    out.insert("version", section(replay.version())?);
    out.insert("header", section(replay.header())?);
    out.insert("details", section(replay.details())?);
    out.insert("init_data", section(replay.init_data())?);
    out.insert("tracker_events", section(replay.tracker_events())?);

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// A missing member becomes `null`; any other failure ends the dump.
fn section<T: serde::Serialize>(result: Result<T, ReplayError>) -> Result<Json, Box<dyn Error>> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(ReplayError::Archive(
            err @ (ArchiveError::MissingMember(_) | ArchiveError::MissingUserData),
        )) => {
            tracing::warn!(error = %err, "skipping");
            Ok(Json::Null)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_paths_and_optional_supplemental() {
        let cli = Cli::try_parse_from(["replay-dump", "protocol.py", "members"]).unwrap();
        assert_eq!(cli.schema, PathBuf::from("protocol.py"));
        assert_eq!(cli.members, PathBuf::from("members"));
        assert!(cli.supplemental.is_none());

        let cli = Cli::try_parse_from(["replay-dump", "protocol.py", "members", "-s", "extra.json"])
            .unwrap();
        assert_eq!(cli.supplemental, Some(PathBuf::from("extra.json")));
    }

    #[test]
    fn test_missing_member_dir_is_rejected() {
        assert!(Cli::try_parse_from(["replay-dump", "protocol.py"]).is_err());
    }
}
