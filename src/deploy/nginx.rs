use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    deploy::template::Template,
    foundation::error::{TpdneError, TpdneResult},
};

/// Default site definition serving the public image directory.
pub const DEFAULT_NGINX_TEMPLATE: &str = r#"server {
    listen 80;
    listen [::]:80;

    server_name {{server_name}};

    root {{root}};
    index {{index}};

    location / {
        # The image behind the index changes every iteration.
        add_header Cache-Control "no-store, must-revalidate";
        expires off;
        try_files $uri $uri/ =404;
    }
}
"#;

/// Inputs of the reverse-proxy site file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NginxSite {
    /// Directory holding the public pointers.
    pub root: PathBuf,
    /// File name of the public image, served as the index.
    pub index: String,
    pub server_name: String,
}

impl NginxSite {
    pub fn validate(&self) -> TpdneResult<()> {
        if self.index.is_empty() || self.index.contains('/') {
            return Err(TpdneError::config(format!(
                "nginx index must be a bare file name, got '{}'",
                self.index
            )));
        }
        if self.server_name.trim().is_empty() || self.server_name.contains(';') {
            return Err(TpdneError::config(format!(
                "invalid nginx server name '{}'",
                self.server_name
            )));
        }
        Ok(())
    }
}

pub fn render_nginx_site(template: &Template, site: &NginxSite) -> TpdneResult<String> {
    site.validate()?;
    let values = BTreeMap::from([
        ("root", site.root.display().to_string()),
        ("index", site.index.clone()),
        ("server_name", site.server_name.clone()),
    ]);
    template.render(&values)
}
