//! Subprocess invocation for the `cbsd` tool.

use crate::args::ToArgs;
use crate::error::{CbsdError, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Abstraction over external process invocation.
///
/// The production implementation spawns a real process; tests substitute a
/// mock returning canned output. Environment overrides are scoped to a
/// single call, so one shared executor can serve concurrent callers without
/// one call's environment leaking into another's.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `program` with `args`, layering `env` over the inherited
    /// environment for this call only, and capture standard output.
    ///
    /// The child's exit status is not inspected: `cbsd` reports logical
    /// failures in its output text, not its exit code. Only a spawn or IO
    /// failure is an error.
    ///
    /// No timeout is imposed; a hung tool hangs the caller. Callers that
    /// need cancellation must wrap the future with their own deadline.
    async fn run(&self, program: &str, args: &[String], env: &[(&str, &str)]) -> Result<Vec<u8>>;

    /// Run `program` with `args` followed by the marshaled fields of
    /// `config`, appended in the configuration's declaration order.
    async fn run_with_config(
        &self,
        program: &str,
        args: &[String],
        config: &(dyn ToArgs + Sync),
        env: &[(&str, &str)],
    ) -> Result<Vec<u8>> {
        let mut full = args.to_vec();
        full.extend(config.to_args());
        self.run(program, &full, env).await
    }
}

/// Executor spawning real OS processes via tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl ShellExecutor {
    /// Create a new shell executor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn run(&self, program: &str, args: &[String], env: &[(&str, &str)]) -> Result<Vec<u8>> {
        debug!(command = %command_line(program, args), "spawning process");

        let output = Command::new(program)
            .args(args)
            .envs(env.iter().copied())
            .output()
            .await
            .map_err(|source| CbsdError::Exec {
                program: program.to_string(),
                source,
            })?;

        debug!(
            status = ?output.status.code(),
            stdout_len = output.stdout.len(),
            "process finished"
        );

        Ok(output.stdout)
    }
}

/// Render the full command line for logging.
fn command_line(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// One recorded invocation: program, full argument vector, env pairs.
    #[derive(Debug, Clone)]
    pub(crate) struct Invocation {
        pub program: String,
        pub args: Vec<String>,
        pub env: Vec<(String, String)>,
    }

    /// Executor returning canned output (or a launch error) and recording
    /// every invocation for assertions.
    pub(crate) struct MockExecutor {
        output: std::result::Result<Vec<u8>, String>,
        pub calls: Mutex<Vec<Invocation>>,
    }

    impl MockExecutor {
        pub fn returning(output: &str) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(output.as_bytes().to_vec()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                output: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn last_call(&self) -> Invocation {
            self.calls.lock().unwrap().last().cloned().expect("no calls recorded")
        }
    }

    #[async_trait]
    impl Executor for MockExecutor {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            env: &[(&str, &str)],
        ) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            });
            match &self.output {
                Ok(bytes) => Ok(bytes.clone()),
                Err(message) => Err(CbsdError::Exec {
                    program: program.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, message.clone()),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgList;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let exec = ShellExecutor::new();
        let out = exec
            .run("echo", &["hello".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_env_is_scoped_per_call() {
        let exec = ShellExecutor::new();
        let args = vec!["-c".to_string(), "echo ${CBSD_TEST_VAR:-unset}".to_string()];

        let with_env = exec
            .run("sh", &args, &[("CBSD_TEST_VAR", "scoped")])
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&with_env).trim(), "scoped");

        // A later call on the same executor must not inherit the override.
        let without_env = exec.run("sh", &args, &[]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&without_env).trim(), "unset");
    }

    #[tokio::test]
    async fn test_run_ignores_exit_status() {
        let exec = ShellExecutor::new();
        let args = vec!["-c".to_string(), "echo partial; exit 3".to_string()];
        let out = exec.run("sh", &args, &[]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "partial");
    }

    #[tokio::test]
    async fn test_run_missing_program_is_exec_error() {
        let exec = ShellExecutor::new();
        let err = exec
            .run("cbsd-definitely-not-installed", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CbsdError::Exec { .. }));
    }

    struct EchoConfig;

    impl ToArgs for EchoConfig {
        fn to_args(&self) -> Vec<String> {
            let mut args = ArgList::new();
            args.string("jname", "build");
            args.flag("astart", Some(true));
            args.into_vec()
        }
    }

    #[tokio::test]
    async fn test_run_with_config_appends_marshaled_fields() {
        let exec = ShellExecutor::new();
        let out = exec
            .run_with_config("echo", &["bcreate".to_string(), "inter=0".to_string()], &EchoConfig, &[])
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&out).trim(),
            "bcreate inter=0 jname=build astart=1"
        );
    }
}
