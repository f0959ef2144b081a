use sb_domain::config::{BreakKind, Config, ConfigSeverity, ProviderKind};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3210);
}

#[test]
fn empty_file_yields_classic_pomodoro() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.pomodoro.work_secs, 25 * 60);
    assert_eq!(config.pomodoro.short_break_secs, 5 * 60);
    assert_eq!(config.pomodoro.long_break_secs, 15 * 60);
    assert_eq!(config.pomodoro.min_cycles, 1);
    assert_eq!(config.pomodoro.max_cycles, 8);
    assert_eq!(config.pomodoro.start_cooldown_secs, 300);
}

#[test]
fn community_defaults_match_first_seen_record() {
    let config = Config::default();
    assert_eq!(config.community_defaults.study_channel_name, "study-vc");
    assert_eq!(config.community_defaults.prefix, "!");
    assert_eq!(config.community_defaults.max_session_duration_mins, 120);
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[pomodoro]
work_secs = 20
short_break_secs = 5
long_break_secs = 10
quiz_answer_timeout_secs = 15

[llm]
kind = "disabled"

[transport]
webhook_url = "http://localhost:9000/hooks/studybuddy"

[storage]
state_path = "/var/lib/studybuddy"

[community_defaults]
study_channel_name = "focus-room"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.llm.kind, ProviderKind::Disabled);
    assert_eq!(
        config.transport.webhook_url.as_deref(),
        Some("http://localhost:9000/hooks/studybuddy")
    );
    assert_eq!(config.storage.state_path.to_str(), Some("/var/lib/studybuddy"));
    assert_eq!(config.community_defaults.study_channel_name, "focus-room");

    let timings = config.pomodoro.timings();
    assert_eq!(timings.work.as_secs(), 20);
    assert_eq!(timings.break_after(4, 6).map(|(k, d)| (k, d.as_secs())), Some((BreakKind::Long, 10)));

    assert!(config
        .validate()
        .iter()
        .all(|i| i.severity != ConfigSeverity::Error));
}

#[test]
fn zero_work_duration_is_an_error() {
    let config: Config = toml::from_str("[pomodoro]\nwork_secs = 0").unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "pomodoro.work_secs"));
}
