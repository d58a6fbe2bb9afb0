use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn supabase_defaults() {
    let cfg = GuestbookConfig::from_lookup(lookup_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co/"),
        ("SUPABASE_ANON_KEY", "anon"),
    ]))
    .unwrap();

    assert_eq!(cfg.backend, BackendKind::Supabase);
    assert_eq!(cfg.port, DEFAULT_PORT);
    let remote = cfg.remote.unwrap();
    assert_eq!(remote.url, "https://demo.supabase.co");
    assert_eq!(remote.anon_key, "anon");
    assert_eq!(remote.table, DEFAULT_SIGNATURES_TABLE);
    assert_eq!(remote.timeouts, RemoteTimeouts::default());
}

#[test]
fn overrides_are_parsed() {
    let cfg = GuestbookConfig::from_lookup(lookup_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("SIGNATURES_TABLE", "yearbook"),
        ("SUPABASE_REQUEST_TIMEOUT_SECS", "42"),
        ("SUPABASE_CONNECT_TIMEOUT_SECS", "7"),
        ("GUESTBOOK_INIT_DEADLINE_SECS", "3"),
        ("PORT", "8080"),
    ]))
    .unwrap();

    assert_eq!(cfg.port, 8080);
    let remote = cfg.remote.unwrap();
    assert_eq!(remote.table, "yearbook");
    assert_eq!(remote.timeouts, RemoteTimeouts { request_secs: 42, connect_secs: 7, init_deadline_secs: 3 });
    assert_eq!(remote.timeouts.init_deadline(), Duration::from_secs(3));
}

#[test]
fn invalid_timeout_falls_back_to_default() {
    let cfg = GuestbookConfig::from_lookup(lookup_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("SUPABASE_REQUEST_TIMEOUT_SECS", "soon"),
        ("SUPABASE_CONNECT_TIMEOUT_SECS", "0"),
        ("GUESTBOOK_INIT_DEADLINE_SECS", "0"),
    ]))
    .unwrap();

    let timeouts = cfg.remote.unwrap().timeouts;
    assert_eq!(timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(timeouts.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    assert_eq!(timeouts.init_deadline_secs, DEFAULT_INIT_DEADLINE_SECS);
}

#[test]
fn zero_request_timeout_falls_back_to_default() {
    let cfg = GuestbookConfig::from_lookup(lookup_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("SUPABASE_REQUEST_TIMEOUT_SECS", "0"),
    ]))
    .unwrap();

    assert_eq!(cfg.remote.unwrap().timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn memory_backend_needs_no_remote() {
    let cfg = GuestbookConfig::from_lookup(lookup_from(&[("GUESTBOOK_BACKEND", "memory")])).unwrap();
    assert_eq!(cfg.backend, BackendKind::Memory);
    assert!(cfg.remote.is_none());
}

#[test]
fn missing_url_errors() {
    let err = GuestbookConfig::from_lookup(lookup_from(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingVar { var: "SUPABASE_URL" }));
}

#[test]
fn missing_key_errors() {
    let err =
        GuestbookConfig::from_lookup(lookup_from(&[("SUPABASE_URL", "https://demo.supabase.co")])).unwrap_err();
    assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
}

#[test]
fn unknown_backend_errors() {
    let err = GuestbookConfig::from_lookup(lookup_from(&[("GUESTBOOK_BACKEND", "sqlite")])).unwrap_err();
    assert!(err.to_string().contains("unknown GUESTBOOK_BACKEND"));
}

#[test]
fn invalid_port_errors() {
    let err = GuestbookConfig::from_lookup(lookup_from(&[("GUESTBOOK_BACKEND", "memory"), ("PORT", "http")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
