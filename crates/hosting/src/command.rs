//! Command-line hosting: run an external program that uploads the pack.
//!
//! The configured argument list is a template. Every occurrence of the
//! placeholder, including inside larger arguments, is replaced by the
//! artifact path when the command runs. The program must exit successfully
//! and print the pack URL on the first non-empty line of stdout; an optional
//! second line carries the pack hash.

use std::path::Path;
use std::process::Stdio;
use std::sync::RwLock;

use tokio::process::Command;
use tracing::debug;

use crate::error::UploadError;
use crate::provider::{HostedPack, HostingProvider, UploadFuture};

pub struct CommandProvider {
    template: Vec<String>,
    placeholder: String,
    hosted: RwLock<Option<HostedPack>>,
}

impl CommandProvider {
    pub fn new(template: Vec<String>, placeholder: impl Into<String>) -> Self {
        Self {
            template,
            placeholder: placeholder.into(),
            hosted: RwLock::new(None),
        }
    }

    pub fn template(&self) -> &[String] {
        &self.template
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// The argument vector for uploading `pack`.
    pub fn command_for(&self, pack: &Path) -> Vec<String> {
        if self.placeholder.is_empty() {
            return self.template.clone();
        }
        let path = pack.to_string_lossy();
        self.template
            .iter()
            .map(|arg| arg.replace(&self.placeholder, &path))
            .collect()
    }
}

impl HostingProvider for CommandProvider {
    fn name(&self) -> &str {
        "cmd"
    }

    fn upload_pack<'a>(&'a self, pack: &'a Path) -> UploadFuture<'a> {
        Box::pin(async move {
            let argv = self.command_for(pack);
            let Some((program, args)) = argv.split_first() else {
                return Err(UploadError::CommandFailed("empty command line".into()));
            };

            debug!(program = %program, args = ?args, "running upload command");
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output()
                .await?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(UploadError::CommandFailed(format!(
                    "{program} exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
            let url = lines.next().ok_or(UploadError::MissingUrl)?.to_string();
            let hash = lines.next().map(str::to_string);

            *self.hosted.write().unwrap_or_else(|e| e.into_inner()) =
                Some(HostedPack { url, hash });
            Ok(())
        })
    }

    fn pack_url(&self) -> Option<String> {
        let hosted = self.hosted.read().unwrap_or_else(|e| e.into_inner());
        hosted.as_ref().map(|h| h.url.clone())
    }

    fn pack_hash(&self) -> Option<String> {
        let hosted = self.hosted.read().unwrap_or_else(|e| e.into_inner());
        hosted.as_ref().and_then(|h| h.hash.clone())
    }
}
