/*!
 * Device list change tracking.
 *
 * The HDC server has no push notification for target changes, so the
 * client polls `list targets` and reports a list only when it differs from
 * the previous poll.
 */

/// Remembers the last device list and detects changes between polls
#[derive(Debug, Default, Clone)]
pub struct DeviceListTracker {
    previous: Vec<String>,
}

impl DeviceListTracker {
    /// Create a tracker that starts from an empty device list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly polled list.
    ///
    /// Returns the list when it differs from the previous one.
    pub fn update(&mut self, devices: Vec<String>) -> Option<&[String]> {
        if devices == self.previous {
            return None;
        }
        self.previous = devices;
        Some(&self.previous)
    }

    /// The last recorded list
    pub fn current(&self) -> &[String] {
        &self.previous
    }
}

/// Parse the `list targets` response into device ids
pub(crate) fn parse_target_list(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "[Empty]")
        .map(str::to_string)
        .collect()
}

/// Extract the device id from the `wait` response
///
/// The server answers `Wait for connected target is <id>`.
pub(crate) fn parse_wait_response(response: &str) -> String {
    match response.split_once("is ") {
        Some((_, id)) => id.trim().to_string(),
        None => response.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tracker_reports_changes_only() {
        let mut tracker = DeviceListTracker::new();

        assert!(tracker.update(Vec::new()).is_none());
        assert_eq!(tracker.update(list(&["A"])).unwrap(), ["A"]);
        assert!(tracker.update(list(&["A"])).is_none());
        assert_eq!(tracker.update(list(&["A", "B"])).unwrap(), ["A", "B"]);
        assert_eq!(tracker.update(Vec::new()).unwrap().len(), 0);
        assert!(tracker.current().is_empty());
    }

    #[test]
    fn test_parse_target_list() {
        assert_eq!(
            parse_target_list("FMR0223C13000649\r\n127.0.0.1:5555\n\n"),
            list(&["FMR0223C13000649", "127.0.0.1:5555"])
        );
        assert!(parse_target_list("[Empty]\n").is_empty());
        assert!(parse_target_list("").is_empty());
    }

    #[test]
    fn test_parse_wait_response() {
        assert_eq!(
            parse_wait_response("Wait for connected target is FMR0223C13000649\n"),
            "FMR0223C13000649"
        );
        assert_eq!(parse_wait_response(" FMR0223C13000649 "), "FMR0223C13000649");
    }
}
