//! Unit tests for deployment environment detection.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use crate::environment::{DeploymentEnvironment, PLATFORM_OVERRIDE, Platform};

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_markers_is_persistent() {
        let env = DeploymentEnvironment::from_lookup(lookup_from(&[]));
        assert_eq!(env.platform(), &Platform::Persistent);
        assert!(env.has_persistent_filesystem());
        assert!(!env.is_production());
    }

    #[rstest]
    #[case("VERCEL")]
    #[case("VERCEL_ENV")]
    #[case("NOW_REGION")]
    #[case("AWS_LAMBDA_FUNCTION_NAME")]
    #[case("NETLIFY")]
    fn test_marker_detects_serverless(#[case] marker: &str) {
        let env = DeploymentEnvironment::from_lookup(lookup_from(&[(marker, "1")]));
        assert!(env.is_serverless());
        assert_eq!(
            env.platform(),
            &Platform::Serverless {
                marker: marker.to_string()
            }
        );
        assert_eq!(env.platform_name(), "serverless");
    }

    #[test]
    fn test_empty_marker_is_ignored() {
        let env = DeploymentEnvironment::from_lookup(lookup_from(&[("VERCEL", "  ")]));
        assert!(env.has_persistent_filesystem());
    }

    #[test]
    fn test_override_wins_over_markers() {
        let env = DeploymentEnvironment::from_lookup(lookup_from(&[
            ("VERCEL", "1"),
            (PLATFORM_OVERRIDE, "persistent"),
        ]));
        assert!(env.has_persistent_filesystem());

        let env = DeploymentEnvironment::from_lookup(lookup_from(&[(PLATFORM_OVERRIDE, "serverless")]));
        assert!(env.is_serverless());
    }

    #[test]
    fn test_run_mode_production() {
        let env = DeploymentEnvironment::from_lookup(lookup_from(&[("RUN_MODE", "production")]));
        assert!(env.is_production());
        assert_eq!(env.mode_name(), "production");

        let env = DeploymentEnvironment::from_lookup(lookup_from(&[("RUN_MODE", "development")]));
        assert!(!env.is_production());
        assert_eq!(env.mode_name(), "development");
    }

    #[test]
    fn test_detect_reads_process_environment() {
        let env = temp_env::with_vars(
            [
                ("NETLIFY", Some("true")),
                ("VERCEL", None),
                ("VERCEL_ENV", None),
                ("NOW_REGION", None),
                ("AWS_LAMBDA_FUNCTION_NAME", None),
                (PLATFORM_OVERRIDE, None),
            ],
            DeploymentEnvironment::detect,
        );
        assert!(env.is_serverless());
    }

    #[test]
    fn test_constructors() {
        assert!(DeploymentEnvironment::persistent().has_persistent_filesystem());
        assert!(DeploymentEnvironment::serverless("VERCEL").is_serverless());
        assert!(
            DeploymentEnvironment::persistent()
                .with_production(true)
                .is_production()
        );
    }
}
