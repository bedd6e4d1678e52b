use super::normalize_name;

/// Whether `name` equals `zone` or sits below it, label-wise.
/// Both arguments are expected to be normalized.
fn is_subdomain(zone: &str, name: &str) -> bool {
    if zone.is_empty() || zone == name {
        return true;
    }
    name.strip_suffix(zone)
        .map(|head| head.ends_with('.'))
        .unwrap_or(false)
}

/// Returns `name` as a lowercase fully-qualified name.
pub fn to_fqdn(name: &str) -> String {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        ".".to_string()
    } else {
        format!("{}.", normalized)
    }
}

/// The zones a resolver is authoritative for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    origins: Vec<String>,
}

impl Zones {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins: Vec<String> = origins.into_iter().map(|z| to_fqdn(z.as_ref())).collect();
        origins.sort();
        origins.dedup();
        Self { origins }
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    /// Longest configured zone containing `name`, as a fully-qualified name.
    pub fn matches(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.origins
            .iter()
            .filter(|zone| is_subdomain(&normalize_name(zone), &name))
            .max_by_key(|zone| zone.len())
            .map(String::as_str)
    }
}

/// Names for which a negative answer is handed to the next handler instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fallthrough {
    #[default]
    Disabled,
    All,
    Zones(Zones),
}

impl Fallthrough {
    /// An empty zone list means every name falls through.
    pub fn from_zones(zones: &[String]) -> Self {
        if zones.is_empty() {
            Fallthrough::All
        } else {
            Fallthrough::Zones(Zones::new(zones))
        }
    }

    pub fn through(&self, name: &str) -> bool {
        match self {
            Fallthrough::Disabled => false,
            Fallthrough::All => true,
            Fallthrough::Zones(zones) => zones.matches(name).is_some(),
        }
    }
}
