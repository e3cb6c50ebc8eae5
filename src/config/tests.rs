use super::*;

#[test]
fn defaults_resolve_without_any_sources() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.public_scheme, "http");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(settings.database.url.is_none());
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), DEFAULT_CACHE_CAPACITY);
    assert!(!settings.cache.warm_on_startup);
    assert_eq!(settings.media.root, PathBuf::from("/media/"));
    assert_eq!(settings.media.url, "/media/");
    assert!(settings.auth.tokens.is_empty());
    assert_eq!(settings.site.host, "127.0.0.1:3000");
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.capacity = Some(50);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_capacity: Some(8),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.capacity.get(), 8);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.capacity",
            ..
        }
    ));
}

#[test]
fn public_scheme_must_be_http_or_https() {
    let mut raw = RawSettings::default();
    raw.server.public_scheme = Some("HTTPS".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.public_scheme, "https");

    let mut raw = RawSettings::default();
    raw.server.public_scheme = Some("ftp".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn media_root_must_be_absolute() {
    let mut raw = RawSettings::default();
    raw.media.root = Some(PathBuf::from("media"));

    let err = Settings::from_raw(raw).expect_err("relative root");
    assert!(err.to_string().contains("media.root"));
}

#[test]
fn site_public_url_is_validated_and_trimmed() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("https://elvis.example.org/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.public_url, "https://elvis.example.org");
    assert_eq!(settings.site.host, "elvis.example.org");

    let mut raw = RawSettings::default();
    raw.site.public_url = Some("not a url".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn allowed_hosts_default_to_the_public_url_host() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("https://elvis.example.org:8443/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.allowed_hosts, vec!["elvis.example.org"]);

    let mut raw = RawSettings::default();
    raw.site.allowed_hosts = Some(vec![" .Example.net".to_string(), "localhost:3000".to_string()]);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.allowed_hosts, vec![".example.net", "localhost:3000"]);

    let mut raw = RawSettings::default();
    raw.site.allowed_hosts = Some(vec!["evil.test/x".to_string()]);
    let err = Settings::from_raw(raw).expect_err("path in allowed host");
    assert!(err.to_string().contains("site.allowed_hosts"));
}

#[test]
fn blank_database_url_counts_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn duplicate_auth_tokens_are_rejected() {
    let mut raw = RawSettings::default();
    raw.auth.tokens = vec![
        ApiToken {
            username: "ada".to_string(),
            token: "same-secret".to_string(),
        },
        ApiToken {
            username: "grace".to_string(),
            token: "same-secret".to_string(),
        },
    ];

    let err = Settings::from_raw(raw).expect_err("duplicate token");
    assert!(err.to_string().contains("repeats"));
}

#[test]
fn auth_tokens_deserialize_from_toml_tables() {
    let source = r#"
        [[auth.tokens]]
        username = "ada"
        token = "ada-secret"
    "#;
    let raw: RawSettings = Config::builder()
        .add_source(config::File::from_str(source, config::FileFormat::Toml))
        .build()
        .expect("config builds")
        .try_deserialize()
        .expect("raw settings");

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.auth.tokens.len(), 1);
    assert_eq!(settings.auth.tokens[0].username, "ada");
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["elvis"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "elvis",
        "serve",
        "--catalog-fixture",
        "tests/fixtures/catalog.toml",
        "--cache-enabled",
        "false",
        "--media-url",
        "https://cdn.example.org/media/",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(
                serve.overrides.catalog_fixture,
                Some(PathBuf::from("tests/fixtures/catalog.toml"))
            );
            assert_eq!(serve.overrides.cache_enabled, Some(false));
            assert_eq!(
                serve.overrides.media_url.as_deref(),
                Some("https://cdn.example.org/media/")
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn migrate_only_touches_database_url() {
    let args = CliArgs::parse_from([
        "elvis",
        "migrate",
        "--database-url",
        "postgres://example/elvis",
    ]);

    let Some(Command::Migrate(migrate)) = args.command else {
        panic!("expected migrate command");
    };

    let mut raw = RawSettings::default();
    raw.apply_database_override(&migrate.database);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.database.url.as_deref(),
        Some("postgres://example/elvis")
    );
}
