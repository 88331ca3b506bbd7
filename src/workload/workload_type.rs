//! Workload type definitions

/// Supported benchmark workload types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadType {
    Ping,
    Set,
    Get,
    GeoAdd,
    GeoRadius,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 5] = [
        WorkloadType::Ping,
        WorkloadType::Set,
        WorkloadType::Get,
        WorkloadType::GeoAdd,
        WorkloadType::GeoRadius,
    ];

    /// Parse workload type from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PING" => Some(Self::Ping),
            "SET" => Some(Self::Set),
            "GET" => Some(Self::Get),
            "GEOADD" => Some(Self::GeoAdd),
            "GEORADIUS" => Some(Self::GeoRadius),
            _ => None,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Set => "SET",
            Self::Get => "GET",
            Self::GeoAdd => "GEOADD",
            Self::GeoRadius => "GEORADIUS",
        }
    }
}

impl std::fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workload_types() {
        assert_eq!(WorkloadType::parse("ping"), Some(WorkloadType::Ping));
        assert_eq!(WorkloadType::parse("PING"), Some(WorkloadType::Ping));
        assert_eq!(WorkloadType::parse("GeoAdd"), Some(WorkloadType::GeoAdd));
        assert_eq!(WorkloadType::parse("georadius"), Some(WorkloadType::GeoRadius));
        assert_eq!(WorkloadType::parse("unknown"), None);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for workload in WorkloadType::ALL {
            assert_eq!(WorkloadType::parse(&workload.to_string()), Some(workload));
        }
    }
}
