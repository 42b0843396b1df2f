use stream_bridge_core::entry::PublishTarget;

pub const EVENT_BUS_NAME_VAR: &str = "EventBusName";
pub const EVENT_SOURCE_NAME_VAR: &str = "EventSourceName";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} must be configured")]
pub struct ConfigError {
    pub name: &'static str,
}

pub fn publish_target_from_env() -> Result<PublishTarget, ConfigError> {
    publish_target_from_lookup(|name| std::env::var(name).ok())
}

/// Values are passed through as given; EventBridge is the judge of validity.
pub fn publish_target_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PublishTarget, ConfigError> {
    let required = |name: &'static str| lookup(name).ok_or(ConfigError { name });

    Ok(PublishTarget {
        event_bus_name: required(EVENT_BUS_NAME_VAR)?,
        event_source: required(EVENT_SOURCE_NAME_VAR)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_both_variables() {
        let vars = HashMap::from([
            (EVENT_BUS_NAME_VAR, "orders-bus"),
            (EVENT_SOURCE_NAME_VAR, "com.example.orders"),
        ]);

        let target = publish_target_from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .expect("config should load");
        assert_eq!(target.event_bus_name, "orders-bus");
        assert_eq!(target.event_source, "com.example.orders");
    }

    #[test]
    fn reports_missing_variable_by_name() {
        let vars = HashMap::from([(EVENT_BUS_NAME_VAR, "orders-bus")]);

        let error = publish_target_from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .expect_err("missing source should fail");
        assert_eq!(error.to_string(), "EventSourceName must be configured");
    }
}
