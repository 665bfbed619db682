use anyhow::{anyhow, bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::user::Identity;

/// Directory mutations persisted to the WAL
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    Register {
        identity: Identity,
        username: String,
        credential: String,
    },
    FraudStatus {
        identity: Identity,
        fraudulent: bool,
    },
}

impl WalOperation {
    // Free-form fields are hex-encoded so they can never contain the separator
    fn to_line(&self) -> String {
        match self {
            WalOperation::Register {
                identity,
                username,
                credential,
            } => format!(
                "REGISTER|{}|{}|{}",
                hex::encode(identity.as_str()),
                hex::encode(username),
                hex::encode(credential)
            ),
            WalOperation::FraudStatus {
                identity,
                fraudulent,
            } => {
                let flag = if *fraudulent { "1" } else { "0" };
                format!("FRAUD_STATUS|{}|{}", hex::encode(identity.as_str()), flag)
            }
        }
    }

    fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"REGISTER") => {
                if parts.len() != 4 {
                    bail!("Invalid REGISTER format");
                }
                let identity = decode_field(parts[1]).context("Invalid identity")?;
                let username = decode_field(parts[2]).context("Invalid username")?;
                let credential = decode_field(parts[3]).context("Invalid credential")?;
                if identity.is_empty() {
                    bail!("identity must not be empty");
                }

                Ok(WalOperation::Register {
                    identity: Identity::new(identity),
                    username,
                    credential,
                })
            }
            Some(&"FRAUD_STATUS") => {
                if parts.len() != 3 {
                    bail!("Invalid FRAUD_STATUS format");
                }
                let identity = decode_field(parts[1]).context("Invalid identity")?;
                let fraudulent = match parts[2] {
                    "1" => true,
                    "0" => false,
                    other => bail!("Invalid fraud flag '{}'", other),
                };

                Ok(WalOperation::FraudStatus {
                    identity: Identity::new(identity),
                    fraudulent,
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

fn decode_field(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex")?;
    String::from_utf8(bytes).map_err(|e| anyhow!("Field is not UTF-8: {}", e))
}

pub struct Wal {
    file: Mutex<File>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open WAL file {}", path.display()))?;

        Ok(Wal {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_line();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_line(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }

    /// Replace the whole log with `operations`.
    ///
    /// The new contents are written to a sibling file and renamed over the log,
    /// so a crash leaves either the old or the new log in place.
    pub fn rewrite(&self, operations: &[WalOperation]) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL lock poisoned"))?;

        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp = File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            for op in operations {
                writeln!(tmp, "{}", op.to_line()).context("Failed to write compacted WAL")?;
            }
            tmp.sync_all().context("Failed to sync compacted WAL")?;
        }

        fs::rename(&tmp_path, &self.path).context("Failed to replace WAL")?;

        // The old handle still points at the replaced file
        *file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to reopen WAL file {}", self.path.display()))?;

        Ok(())
    }
}
