//! Module license reading and per-capability validation.
//!
//! License enforcement at this layer is advisory: the gate reports which
//! required capabilities lack a valid record, and the orchestrator logs
//! the result without refusing to run. Actual enforcement, if any, lives
//! in the solver itself.

use crate::error::LicenseError;
use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use simrun_core::Capability;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// One record of the module license file.
///
/// Serialized as `product-id,expiry-date,signature` where the signature
/// is the hex-encoded SHA-256 of `product-id,expiry-date,account,password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRecord {
    /// Product identifier of the licensed capability.
    pub product_id: String,
    /// Last day the record is valid.
    pub expiry: NaiveDate,
    /// Hex-encoded record signature.
    pub signature: String,
}

impl LicenseRecord {
    /// Issue a signed record for an account/password pair.
    pub fn issue(capability: Capability, expiry: NaiveDate, account: &str, password: &str) -> Self {
        let product_id = capability.id().to_string();
        let signature = record_signature(&product_id, expiry, account, password);
        Self {
            product_id,
            expiry,
            signature,
        }
    }

    /// Whether the record is signed for the given credentials and still
    /// valid today.
    pub fn validate(&self, account: &str, password: &str) -> bool {
        if Utc::now().date_naive() > self.expiry {
            return false;
        }
        self.signature == record_signature(&self.product_id, self.expiry, account, password)
    }
}

impl fmt::Display for LicenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.product_id, self.expiry, self.signature)
    }
}

fn record_signature(product_id: &str, expiry: NaiveDate, account: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{},{},{},{}", product_id, expiry, account, password));
    hex::encode(hasher.finalize())
}

/// A parsed module license file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleLicense {
    records: HashMap<String, LicenseRecord>,
}

impl ModuleLicense {
    /// Read and parse a license file.
    pub fn read(path: &Path) -> Result<Self, LicenseError> {
        let text = std::fs::read_to_string(path).map_err(|source| LicenseError::Unavailable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse license file content. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, LicenseError> {
        let mut records = HashMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(3, ',');
            let record = match (fields.next(), fields.next(), fields.next()) {
                (Some(product_id), Some(expiry), Some(signature)) => {
                    let expiry = expiry.trim().parse::<NaiveDate>().map_err(|e| {
                        LicenseError::Malformed {
                            line: index + 1,
                            reason: format!("invalid expiry date: {}", e),
                        }
                    })?;
                    LicenseRecord {
                        product_id: product_id.trim().to_string(),
                        expiry,
                        signature: signature.trim().to_string(),
                    }
                }
                _ => {
                    return Err(LicenseError::Malformed {
                        line: index + 1,
                        reason: "expected 'product-id,expiry,signature'".to_string(),
                    })
                }
            };
            records.insert(record.product_id.clone(), record);
        }
        Ok(Self { records })
    }

    /// Check the account/password pair against the record for one
    /// capability. Capabilities without a record validate as false.
    pub fn validate_record(&self, product_id: &str, account: &str, password: &str) -> bool {
        self.records
            .get(product_id)
            .map(|record| record.validate(account, password))
            .unwrap_or(false)
    }

    /// Render the license back to its file form, one record per line.
    pub fn to_file_string(&self) -> String {
        let mut lines: Vec<String> = self.records.values().map(|r| r.to_string()).collect();
        lines.sort();
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Add a record, replacing any existing one for the same product.
    pub fn insert(&mut self, record: LicenseRecord) {
        self.records.insert(record.product_id.clone(), record);
    }
}

/// Validates a set of required capabilities against the license file.
pub struct LicenseGate;

impl LicenseGate {
    /// Check each required capability against the license record source.
    ///
    /// Returns the capabilities without a valid record. A read/parse
    /// failure fails the whole validation step; the caller decides the
    /// policy (the task orchestrator logs it and proceeds unlicensed).
    /// Emits one warning per missing capability; no side effects on
    /// success.
    pub fn check(
        required: &[Capability],
        license_file: &Path,
        account: &str,
        password: &str,
    ) -> Result<Vec<Capability>, LicenseError> {
        let license = ModuleLicense::read(license_file)?;

        let mut missing = Vec::new();
        for capability in required {
            if !license.validate_record(capability.id(), account, password) {
                warn!(
                    capability = capability.name(),
                    product_id = capability.id(),
                    "Missing license for '{}' (product-id: {})",
                    capability.name(),
                    capability.id()
                );
                missing.push(*capability);
            }
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future_date() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(30)
    }

    #[test]
    fn test_record_round_trip() {
        let record = LicenseRecord::issue(Capability::HeatTransfer, future_date(), "acme", "s3cret");
        let license = ModuleLicense::parse(&format!("# comment\n\n{}\n", record)).unwrap();

        assert!(license.validate_record("heat-transfer", "acme", "s3cret"));
        assert!(!license.validate_record("heat-transfer", "acme", "wrong"));
        assert!(!license.validate_record("stress", "acme", "s3cret"));
    }

    #[test]
    fn test_expired_record_invalid() {
        let expired = Utc::now().date_naive() - Duration::days(1);
        let record = LicenseRecord::issue(Capability::Stress, expired, "acme", "s3cret");
        let mut license = ModuleLicense::default();
        license.insert(record);

        assert!(!license.validate_record("stress", "acme", "s3cret"));
    }

    #[test]
    fn test_malformed_record() {
        let err = ModuleLicense::parse("stress,not-a-date,sig\n").unwrap_err();
        assert!(matches!(err, LicenseError::Malformed { line: 1, .. }));

        let err = ModuleLicense::parse("only-one-field\n").unwrap_err();
        assert!(matches!(err, LicenseError::Malformed { .. }));
    }

    #[test]
    fn test_unreadable_file() {
        let err = ModuleLicense::read(Path::new("/nonexistent/lic.key")).unwrap_err();
        assert!(matches!(err, LicenseError::Unavailable { .. }));
    }

    #[test]
    fn test_gate_reports_missing_only() {
        let dir = std::env::temp_dir().join(format!(
            "simrun-license-test-{}",
            simrun_core::SolverTaskId::generate()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lic.key");

        let mut license = ModuleLicense::default();
        license.insert(LicenseRecord::issue(
            Capability::HeatTransfer,
            future_date(),
            "acme",
            "s3cret",
        ));
        std::fs::write(&path, license.to_file_string()).unwrap();

        let missing = LicenseGate::check(
            &[Capability::HeatTransfer, Capability::FluidFlow],
            &path,
            "acme",
            "s3cret",
        )
        .unwrap();
        assert_eq!(missing, vec![Capability::FluidFlow]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
