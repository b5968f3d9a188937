use k8s_openapi::api::core::v1::Event;

use crate::snapshot::EventSnapshot;

/// Field selector matching the events recorded against one object
pub fn involved_object_selector(name: &str) -> String {
    format!("involvedObject.name={name}")
}

impl From<&Event> for EventSnapshot {
    fn from(event: &Event) -> Self {
        // last_timestamp is unset for events published through events.k8s.io
        let timestamp = event
            .last_timestamp
            .as_ref()
            .map(|t| t.0)
            .or_else(|| event.event_time.as_ref().map(|t| t.0))
            .or_else(|| event.first_timestamp.as_ref().map(|t| t.0));

        EventSnapshot {
            type_: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, Time};

    #[test]
    fn selector_targets_involved_object() {
        assert_eq!(involved_object_selector("web-1"), "involvedObject.name=web-1");
    }

    #[test]
    fn last_timestamp_is_preferred() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = Event {
            type_: Some("Warning".into()),
            reason: Some("BackOff".into()),
            message: Some("Back-off restarting failed container".into()),
            last_timestamp: Some(Time(last)),
            event_time: Some(MicroTime(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())),
            ..Default::default()
        };

        let snapshot = EventSnapshot::from(&event);
        assert_eq!(snapshot.type_, "Warning");
        assert_eq!(snapshot.reason, "BackOff");
        assert_eq!(snapshot.timestamp, Some(last));
    }

    #[test]
    fn event_time_is_the_fallback() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let event = Event {
            event_time: Some(MicroTime(at)),
            ..Default::default()
        };

        let snapshot = EventSnapshot::from(&event);
        assert_eq!(snapshot.timestamp, Some(at));
        assert_eq!(snapshot.message, "");
    }
}
