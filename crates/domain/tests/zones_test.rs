use kvdns_domain::{Fallthrough, Zones};

#[test]
fn test_longest_zone_wins() {
    let zones = Zones::new(["example.com.", "svc.example.com."]);

    assert_eq!(zones.matches("api.svc.example.com."), Some("svc.example.com."));
    assert_eq!(zones.matches("api.example.com."), Some("example.com."));
}

#[test]
fn test_no_zone_match() {
    let zones = Zones::new(["example.com."]);

    assert_eq!(zones.matches("example.org."), None);
    assert_eq!(zones.matches("notexample.com."), None);
}

#[test]
fn test_zone_match_is_case_insensitive() {
    let zones = Zones::new(["Example.COM"]);

    assert_eq!(zones.matches("API.example.com"), Some("example.com."));
}

#[test]
fn test_root_zone_matches_everything() {
    let zones = Zones::new(["."]);

    assert_eq!(zones.matches("anything.org."), Some("."));
}

#[test]
fn test_fallthrough_disabled_by_default() {
    assert!(!Fallthrough::default().through("api.example.com."));
}

#[test]
fn test_fallthrough_without_zones_covers_all_names() {
    let fall = Fallthrough::from_zones(&[]);

    assert!(fall.through("api.example.com."));
    assert!(fall.through("example.org."));
}

#[test]
fn test_fallthrough_limited_to_zones() {
    let fall = Fallthrough::from_zones(&["dev.example.com.".to_string()]);

    assert!(fall.through("api.dev.example.com."));
    assert!(!fall.through("api.example.com."));
}
