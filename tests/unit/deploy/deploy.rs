use super::{
    nginx::{DEFAULT_NGINX_TEMPLATE, NginxSite, render_nginx_site},
    systemd::{DEFAULT_SYSTEMD_TEMPLATE, SystemdUnit, render_systemd_unit},
    template::Template,
    *,
};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn site() -> NginxSite {
    NginxSite {
        root: PathBuf::from("/srv/www/out"),
        index: "random.webp".to_string(),
        server_name: "faces.example.org".to_string(),
    }
}

#[test]
fn nginx_site_renders_root_index_and_server_name() {
    let text = render_nginx_site(&Template::new(DEFAULT_NGINX_TEMPLATE), &site()).unwrap();
    assert!(text.contains("root /srv/www/out;"));
    assert!(text.contains("index random.webp;"));
    assert!(text.contains("server_name faces.example.org;"));
    assert!(text.contains("try_files $uri $uri/ =404;"));
    assert!(!text.contains("{{"));
}

#[test]
fn nginx_site_rejects_bad_index_and_server_name() {
    let template = Template::new(DEFAULT_NGINX_TEMPLATE);
    let bad_index = NginxSite {
        index: "../random.webp".to_string(),
        ..site()
    };
    assert!(render_nginx_site(&template, &bad_index).is_err());

    let bad_name = NginxSite {
        server_name: "a; include /etc/passwd".to_string(),
        ..site()
    };
    assert!(render_nginx_site(&template, &bad_name).is_err());
}

#[test]
fn custom_templates_are_explicit_per_call() {
    let t = Template::new("{{server_name}} -> {{root}}/{{index}}");
    let text = render_nginx_site(&t, &site()).unwrap();
    assert_eq!(text, "faces.example.org -> /srv/www/out/random.webp");
}

#[test]
fn systemd_unit_runs_executable_with_config_and_sentinel() {
    let unit = SystemdUnit {
        working_dir: PathBuf::from("/opt/tpdne"),
        executable: PathBuf::from("/usr/local/bin/tpdne"),
        script: PathBuf::from("/opt/tpdne/run.json"),
    };
    let text = render_systemd_unit(&Template::new(DEFAULT_SYSTEMD_TEMPLATE), &unit).unwrap();
    assert!(text.contains("WorkingDirectory=/opt/tpdne\n"));
    assert!(text.contains(
        "ExecStart=\"/usr/local/bin/tpdne\" run --config \"/opt/tpdne/run.json\"\n"
    ));
    assert!(text.contains(&format!("Environment={}=1", super::systemd::SUPERVISED_ENV)));
    assert!(text.contains("Restart=always"));
}

#[test]
fn systemd_unit_quotes_paths_with_spaces_and_specifiers() {
    let unit = SystemdUnit {
        working_dir: PathBuf::from("/home/me/my faces"),
        executable: PathBuf::from("/home/me/my faces/bin/tpdne"),
        script: PathBuf::from("/home/me/my faces/100%\"run\".json"),
    };
    let text = render_systemd_unit(&Template::new(DEFAULT_SYSTEMD_TEMPLATE), &unit).unwrap();
    assert!(text.contains("WorkingDirectory=/home/me/my faces\n"));
    assert!(text.contains(
        "ExecStart=\"/home/me/my faces/bin/tpdne\" run --config \"/home/me/my faces/100%%\\\"run\\\".json\"\n"
    ));

    let broken = SystemdUnit {
        script: PathBuf::from("/tmp/a\nb.json"),
        ..unit
    };
    let err = render_systemd_unit(&Template::new(DEFAULT_SYSTEMD_TEMPLATE), &broken).unwrap_err();
    assert!(matches!(err, TpdneError::Config(_)));
}

#[test]
fn write_artifact_requires_existing_dir_and_replaces_contents() {
    let dir = scratch("unit_deploy_write_artifact");
    let first = write_artifact(&dir, "site.conf", "one").unwrap();
    let second = write_artifact(&dir, "site.conf", "two").unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&second).unwrap(), "two");

    let err = write_artifact(&dir.join("missing"), "site.conf", "x").unwrap_err();
    assert!(matches!(err, TpdneError::Config(_)));
}

#[cfg(unix)]
#[test]
fn link_into_points_system_dir_at_artifact() {
    let root = scratch("unit_deploy_link_into");
    let sites = root.join("sites-enabled");
    std::fs::create_dir_all(&sites).unwrap();
    let artifact = write_artifact(&root, "tpdne.conf", "server {}").unwrap();

    let link = link_into(&artifact, &sites).unwrap();
    assert_eq!(link, sites.join("tpdne.conf"));
    assert_eq!(std::fs::read_link(&link).unwrap(), artifact);
    assert_eq!(std::fs::read_to_string(&link).unwrap(), "server {}");

    // Linking again is harmless.
    link_into(&artifact, &sites).unwrap();

    let err = link_into(&artifact, &root.join("nope")).unwrap_err();
    assert!(matches!(err, TpdneError::Config(_)));
}

#[cfg(unix)]
#[test]
fn reinstalling_replaces_an_existing_link() {
    let root = scratch("unit_deploy_relink");
    let (old_dir, new_dir, units) = (root.join("old"), root.join("new"), root.join("units"));
    for d in [&old_dir, &new_dir, &units] {
        std::fs::create_dir_all(d).unwrap();
    }

    let old = write_artifact(&old_dir, "tpdne.service", "[Service]\nold").unwrap();
    let link = link_into(&old, &units).unwrap();
    assert_eq!(std::fs::read_to_string(&link).unwrap(), "[Service]\nold");

    let new = write_artifact(&new_dir, "tpdne.service", "[Service]\nnew").unwrap();
    assert_eq!(link_into(&new, &units).unwrap(), link);
    assert_eq!(std::fs::read_link(&link).unwrap(), new);
    assert_eq!(std::fs::read_to_string(&link).unwrap(), "[Service]\nnew");

    // A plain file left by a manual install is replaced as well.
    std::fs::remove_file(&link).unwrap();
    std::fs::write(&link, "hand written").unwrap();
    link_into(&new, &units).unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), new);
    assert_eq!(std::fs::read_dir(&units).unwrap().count(), 1);
}
