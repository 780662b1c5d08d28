// system-tests/tests/helpers/fake_terraform.rs
// ============================================================================
// Module: Scripted Terraform
// Description: POSIX shell stand-in for the terraform CLI.
// Purpose: Drive the bundled suite end to end without a cloud account.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! The script answers `init`, `apply`, `output`, and `destroy` the way the
//! AWS modules would, deriving every output from the instance's variables.
//! Failures are injected per module by naming the module directory in
//! `FAKE_TF_FAIL_APPLY` or `FAKE_TF_FAIL_DESTROY`. Every invocation is
//! appended to `FAKE_TF_LOG`.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;

use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_TF_LOG"
sub=""
dir=""
state=""
varfile=""
for arg in "$@"; do
  case "$arg" in
    -chdir=*) dir="${arg#-chdir=}" ;;
    -state=*) state="${arg#-state=}" ;;
    -var-file=*) varfile="${arg#-var-file=}" ;;
    -*) ;;
    *) if [ -z "$sub" ]; then sub="$arg"; fi ;;
  esac
done
module=$(basename "$dir")
var() {
  sed -n "s/.*\"$1\": \"\([^\"]*\)\".*/\1/p" "$varfile"
}
case "$sub" in
  init) mkdir -p "$TF_DATA_DIR" ;;
  apply)
    if [ "$module" = "$FAKE_TF_FAIL_APPLY" ]; then
      echo "Error: creating resources for $module: AccessDenied" >&2
      exit 1
    fi
    role=$(var iam_role_name)
    bucket=$(var bucket_name)
    fn=$(var function_name)
    api=$(var api_name)
    param=$(var parameter_name)
    cat > "$state" <<JSON
{
  "lambda_exec_role_arn": {"type": "string", "value": "arn:aws:iam::123456789012:role/$role"},
  "lambda_exec_role_name": {"type": "string", "value": "$role"},
  "bucket_id": {"type": "string", "value": "$bucket"},
  "bucket_name": {"type": "string", "value": "$bucket"},
  "function_arn": {"type": "string", "value": "arn:aws:lambda:us-east-1:123456789012:function:$fn"},
  "function_name": {"type": "string", "value": "$fn"},
  "api_endpoint": {"type": "string", "value": "https://$api.execute-api.us-east-1.amazonaws.com"},
  "api_id": {"type": "string", "value": "$api"},
  "parameter_arn": {"type": "string", "value": "arn:aws:ssm:us-east-1:123456789012:parameter$param"},
  "parameter_name": {"type": "string", "value": "$param"}
}
JSON
    ;;
  output) if [ -f "$state" ]; then cat "$state"; else echo "{}"; fi ;;
  destroy)
    if [ "$module" = "$FAKE_TF_FAIL_DESTROY" ]; then
      echo "Error: deleting resources for $module: DependencyViolation" >&2
      exit 1
    fi
    rm -f "$state"
    ;;
esac
"#;

/// Returns the path of the scripted terraform, writing it on first use.
pub fn fake_terraform() -> io::Result<PathBuf> {
    static SCRIPT_PATH: OnceLock<Result<(TempDir, PathBuf), String>> = OnceLock::new();
    let written = SCRIPT_PATH.get_or_init(|| {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = dir.path().join("terraform");
        fs::write(&path, SCRIPT).map_err(|err| err.to_string())?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|err| err.to_string())?;
        Ok((dir, path))
    });
    written.as_ref().map(|(_, path)| path.clone()).map_err(|err| io::Error::other(err.clone()))
}

/// Invocations recorded in `log`, one argument line per call.
pub fn invocations(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .map(|raw| raw.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Counts calls of `subcommand` against the module directory named `module`.
pub fn count_calls(log: &Path, module: &str, subcommand: &str) -> usize {
    invocations(log)
        .iter()
        .filter(|line| {
            let mut words = line.split_whitespace();
            let chdir = words.next().unwrap_or_default();
            let sub = words.next().unwrap_or_default();
            sub == subcommand && Path::new(chdir).file_name() == Some(OsStr::new(module))
        })
        .count()
}
