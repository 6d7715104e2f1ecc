use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    deploy::template::Template,
    foundation::error::{TpdneError, TpdneResult},
};

/// Environment variable set by the generated unit; its presence means we run supervised.
pub const SUPERVISED_ENV: &str = "TPDNE_SUPERVISED";

/// Default service definition. The supervisor owns restarts, the loop never retries.
pub const DEFAULT_SYSTEMD_TEMPLATE: &str = r#"[Unit]
Description=tpdne image publisher
After=network.target

[Service]
Type=simple
WorkingDirectory={{working_dir}}
ExecStart={{executable}} run --config {{script}}
Environment=TPDNE_SUPERVISED=1
Restart=always
RestartSec=1

[Install]
WantedBy=multi-user.target
"#;

/// Inputs of the supervisor unit. `executable` and `script` are quoted for `ExecStart`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemdUnit {
    pub working_dir: PathBuf,
    pub executable: PathBuf,
    /// Run configuration handed to the executable.
    pub script: PathBuf,
}

pub fn render_systemd_unit(template: &Template, unit: &SystemdUnit) -> TpdneResult<String> {
    let values = BTreeMap::from([
        ("working_dir", single_line(&unit.working_dir)?.replace('%', "%%")),
        ("executable", exec_arg(&single_line(&unit.executable)?)),
        ("script", exec_arg(&single_line(&unit.script)?)),
    ]);
    template.render(&values)
}

fn single_line(path: &Path) -> TpdneResult<String> {
    let s = path.display().to_string();
    if s.contains(['\n', '\r']) {
        return Err(TpdneError::config(format!(
            "path {s:?} contains a line break and cannot go into a unit file"
        )));
    }
    Ok(s)
}

/// Double-quote one `ExecStart` word, escaping quoting and specifier characters.
fn exec_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '%' => out.push_str("%%"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether this process was started by the generated unit.
pub fn is_supervised() -> bool {
    std::env::var_os(SUPERVISED_ENV).is_some_and(|v| !v.is_empty())
}
