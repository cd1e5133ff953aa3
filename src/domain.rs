use serde::{Deserialize, Serialize};

/// one timestamped sample for one room
///
/// readings are never mutated after the sampling cycle creates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// shared cycle timestamp in milliseconds (unix epoch)
    pub timestamp_ms: u64,
    /// room the reading was taken in (a registry key)
    pub room: String,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
}

/// a row of the history table: `time, room, temperature, humidity`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub time: u64,
    pub room: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl From<&Reading> for HistoryRow {
    fn from(r: &Reading) -> Self {
        Self {
            time: r.timestamp_ms,
            room: r.room.clone(),
            temperature: r.temperature,
            humidity: r.humidity,
        }
    }
}

/// which column a chart plots against time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
}

impl Metric {
    pub fn of(&self, row: &HistoryRow) -> f64 {
        match self {
            Metric::Temperature => row.temperature,
            Metric::Humidity => row.humidity,
        }
    }
}

/// insertion-ordered snapshot of the rolling history
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryTable {
    pub columns: [&'static str; 4],
    pub rows: Vec<HistoryRow>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HistoryTable {
    pub const COLUMNS: [&'static str; 4] = ["time", "room", "temperature", "humidity"];

    pub fn new(rows: Vec<HistoryRow>) -> Self {
        Self { columns: Self::COLUMNS, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// distinct rooms in order of first appearance
    pub fn rooms(&self) -> Vec<&str> {
        let mut rooms: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !rooms.contains(&row.room.as_str()) {
                rooms.push(&row.room);
            }
        }
        rooms
    }

    /// `(time, value)` points for one room, oldest first
    pub fn series(&self, room: &str, metric: Metric) -> Vec<(u64, f64)> {
        self.rows
            .iter()
            .filter(|r| r.room == room)
            .map(|r| (r.time, metric.of(r)))
            .collect()
    }
}

/// get current timestamp in milliseconds (unix epoch)
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: u64, room: &str, t: f64, h: f64) -> HistoryRow {
        HistoryRow { time, room: room.into(), temperature: t, humidity: h }
    }

    #[test]
    fn test_timestamp() {
        // should be after 2024
        assert!(now_ms() > 1_700_000_000_000, "timestamp should be after 2024");
    }

    #[test]
    fn rooms_keep_first_appearance_order() {
        let table = HistoryTable::new(vec![
            row(1, "Room 2", 21.0, 50.0),
            row(1, "Room 1", 22.0, 51.0),
            row(2, "Room 2", 23.0, 52.0),
        ]);
        assert_eq!(table.rooms(), vec!["Room 2", "Room 1"]);
    }

    #[test]
    fn series_filters_by_room() {
        let table = HistoryTable::new(vec![
            row(1, "A", 21.0, 50.0),
            row(1, "B", 22.0, 51.0),
            row(2, "A", 23.0, 52.0),
        ]);
        assert_eq!(table.series("A", Metric::Temperature), vec![(1, 21.0), (2, 23.0)]);
        assert_eq!(table.series("B", Metric::Humidity), vec![(1, 51.0)]);
        assert!(table.series("C", Metric::Humidity).is_empty());
    }
}
