//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Variables scrubbed from every child so the host environment never leaks in.
const SCRUBBED: &[&str] = &[
    "ESEC_PRIVATE_KEY",
    "ESEC_PRIVATE_KEYS",
    "ESEC_PRIVATE_KEY_DEV",
    "ESEC_PRIVATE_KEY_PROD",
    "ESEC_TOKEN",
    "ESEC_LOG",
];

impl Test {
    /// Create an esec command running inside the test directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("esec").expect("failed to find esec binary");
        for var in SCRUBBED {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run esec with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run esec")
    }

    /// Run esec with `args` and one extra environment variable.
    pub fn run_with_env(&self, args: &[&str], var: &str, value: &str) -> Output {
        self.cmd()
            .env(var, value)
            .args(args)
            .output()
            .expect("failed to run esec")
    }

    /// `esec keygen --write [--env <env>]`, returning the printed public key.
    pub fn keygen_write(&self, env: &str) -> String {
        let mut args = vec!["keygen", "--write"];
        if !env.is_empty() {
            args.extend(["--env", env]);
        }
        let output = self.run(&args);
        super::assert_success(&output);
        super::stdout(&output).trim().to_string()
    }

    /// `esec encrypt` for one blob.
    pub fn encrypt(&self, env: &str, format: &str) -> Output {
        self.run(&["encrypt", "--env", env, "--format", format])
    }

    /// `esec decrypt` for one blob.
    pub fn decrypt(&self, env: &str, format: &str) -> Output {
        self.run(&["decrypt", "--env", env, "--format", format])
    }

    /// `esec share set <project> <file> --yes` with `token`.
    pub fn share_set(&self, project: &str, file: &str, token: &str) -> Output {
        self.run(&["share", "set", project, file, "--token", token, "--yes"])
    }

    /// `esec share get <project>` with the token taken from `ESEC_TOKEN`.
    pub fn share_get(&self, project: &str, token: &str) -> Output {
        self.run_with_env(&["share", "get", project], "ESEC_TOKEN", token)
    }
}
