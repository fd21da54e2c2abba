use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Machine, Severity};

use crate::CheckContext;

pub const ID: &str = "OctoLintSha1Certificates";

const SHA1_ALGORITHM: &str = "sha1RSA";

/// Finds the server certificate, deployment targets and workers that still
/// use a SHA1 signed certificate.
pub struct Sha1Certificates {
    id: CheckId,
    ctx: CheckContext,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Sha1Usage {
    kind: &'static str,
    name: String,
}

impl Sha1Certificates {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }
}

fn uses_sha1(machine: &Machine) -> bool {
    machine
        .endpoint
        .as_ref()
        .and_then(|e| e.certificate_signature_algorithm.as_deref())
        == Some(SHA1_ALGORITHM)
}

fn sha1_machines(machines: Vec<Machine>, kind: &'static str) -> impl Iterator<Item = Sha1Usage> {
    machines
        .into_iter()
        .filter(uses_sha1)
        .map(move |m| Sha1Usage { kind, name: m.name })
}

#[async_trait]
impl Check for Sha1Certificates {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Security
    }

    async fn execute(&self, _concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let mut usages = Vec::new();

        let certificate = match self.ctx.api.server_certificate().await {
            Ok(certificate) => certificate,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };
        if certificate.signature_algorithm == SHA1_ALGORITHM {
            usages.push(Sha1Usage {
                kind: "Global",
                name: certificate.name,
            });
        }

        let limit = self.ctx.config.max_sha1_certificates_machines;

        let targets = match self.ctx.api.machines(limit).await {
            Ok(targets) => targets,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };
        usages.extend(sha1_machines(targets, "Target"));

        let workers = match self.ctx.api.workers(limit).await {
            Ok(workers) => workers,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };
        usages.extend(sha1_machines(workers, "Worker"));

        if !usages.is_empty() {
            usages.sort();
            let lines: Vec<String> = usages
                .iter()
                .map(|u| format!("{}: {}", u.kind, u.name))
                .collect();

            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following resources use a SHA1 certificate:\n{}",
                    lines.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            "There are no uses of SHA1 certificates in targets, workers or the main Server Certificate",
        )))
    }
}
