//! Text and JSON rendering of search results.

use chrono::Duration;

use crate::domain::{Connection, Itinerary};

/// One connection as `"<line> <arrival> <origin>-<destination>"`.
///
/// # Examples
///
/// ```
/// # use transit_router::domain::{Connection, Coordinates, TransitTime};
/// # use transit_router::format::format_connection;
/// # use chrono::NaiveDate;
/// # let date = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
/// # let at = |s| TransitTime::parse_hms(s, date).unwrap();
/// let connection = Connection {
///     id: 4,
///     company: "MPK Autobusy".into(),
///     line: "A".into(),
///     departure: at("20:57:00"),
///     arrival: at("20:59:00"),
///     origin: "Baltycka".into(),
///     destination: "Broniewskiego".into(),
///     origin_coords: Coordinates::new(51.1366, 17.0306),
///     destination_coords: Coordinates::new(51.1358, 17.0374),
/// };
/// assert_eq!(format_connection(&connection), "A 20:59:00 Baltycka-Broniewskiego");
/// ```
pub fn format_connection(connection: &Connection) -> String {
    connection.to_string()
}

/// Multi-line listing of an itinerary: one line per connection, then a
/// summary.
pub fn format_itinerary(itinerary: &Itinerary) -> String {
    if !itinerary.is_found() {
        return "no route found".to_string();
    }
    if itinerary.route.is_empty() {
        return "already at destination".to_string();
    }

    let mut lines: Vec<String> = itinerary.route.iter().map(format_connection).collect();

    let travel = itinerary.travel_time().unwrap_or_else(Duration::zero);
    lines.push(format!(
        "{} connections, {} transfers, {}h{:02}m on the move, cost {}",
        itinerary.route.len(),
        itinerary.transfers(),
        travel.num_hours(),
        travel.num_minutes() % 60,
        itinerary.cost,
    ));
    lines.join("\n")
}

/// Pretty-printed JSON of an itinerary.
pub fn itinerary_json(itinerary: &Itinerary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::fixtures::*;

    fn itinerary() -> Itinerary {
        Itinerary::new(
            vec![
                conn(1, "1", "A", "08:00:00", "B", "08:10:00"),
                conn(2, "2", "B", "08:20:00", "C", "09:30:00"),
            ],
            1.0,
        )
    }

    #[test]
    fn connection_line() {
        let c = conn(1, "N", "Rynek", "23:50:00", "Dworzec", "24:05:00");
        assert_eq!(format_connection(&c), "N 00:05:00 Rynek-Dworzec");
    }

    #[test]
    fn itinerary_listing() {
        let text = format_itinerary(&itinerary());

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1 08:10:00 A-B",
                "2 09:30:00 B-C",
                "2 connections, 1 transfers, 1h30m on the move, cost 1",
            ]
        );
    }

    #[test]
    fn sentinel_results() {
        assert_eq!(format_itinerary(&Itinerary::not_found()), "no route found");
        assert_eq!(format_itinerary(&Itinerary::infeasible()), "no route found");
        assert_eq!(
            format_itinerary(&Itinerary::already_there()),
            "already at destination"
        );
    }

    #[test]
    fn json_output() {
        let json = itinerary_json(&itinerary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["cost"], 1.0);
        assert_eq!(value["route"][0]["line"], "1");
        assert_eq!(value["route"][0]["origin"], "A");
        assert_eq!(value["route"][1]["arrival"], "2025-03-24T09:30:00");
        assert_eq!(value["route"][1]["destination_coords"]["lat"], 51.1);
    }
}
