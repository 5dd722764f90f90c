#[cfg(test)]
mod tests {
    use crate::commands::ControllerCommand;
    use crate::config::RadarConfig;
    use crate::enums::*;
    use crate::events::RadarEvent;
    use crate::message::{radar_path, BroadcastMessage, ShipView};
    use crate::types::{Position, SimTime};

    #[test]
    fn test_broadcast_message_wire_names() {
        let msg = BroadcastMessage {
            id: 3,
            timestamp: 1_700_000_000,
            range: 5000.0,
            ppi: vec![vec![0, 1], vec![2, 0]],
            ships: vec![ShipView {
                id: 7,
                position: Position::new(1.0, 2.0, 3.0),
                azimuth: 45.0,
                distance: 1200.0,
                bounds: "0 1200 45 20 20".into(),
            }],
            radar_location: Position::new(10.0, 20.0, 5.0),
        };

        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["timestamp"], 1_700_000_000i64);
        assert_eq!(value["range"], 5000.0);
        assert_eq!(value["PPI"][1][0], 2);
        assert_eq!(value["ships"][0]["Id"], 7);
        assert_eq!(value["ships"][0]["Position"]["y"], 2.0);
        assert_eq!(value["ships"][0]["Bounds"], "0 1200 45 20 20");
        assert_eq!(value["radarLocation"]["x"], 10.0);
        assert!(value.get("ppi").is_none());
    }

    #[test]
    fn test_broadcast_message_round_trip() {
        let msg = BroadcastMessage {
            id: 1,
            ppi: vec![vec![0; 4]; 3],
            ..Default::default()
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: BroadcastMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_command_tagged_serde() {
        let cmd = ControllerCommand::SpawnRadar {
            config: RadarConfig::default(),
            position: None,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"SpawnRadar\""));
        assert!(json.contains("\"antennaGainDBi\""));
        let back: ControllerCommand = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ControllerCommand::SpawnRadar { position: None, .. }));

        let json = r#"{"type":"SetWeather","weather":"HeavyRain","foggy":true}"#;
        let cmd: ControllerCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            ControllerCommand::SetWeather {
                weather: Weather::HeavyRain,
                foggy: true
            }
        ));
    }

    #[test]
    fn test_event_tagged_serde() {
        let event = RadarEvent::RotationComplete {
            radar_id: 2,
            rotation: 5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"RotationComplete\""));
        let back: RadarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_radar_path() {
        assert_eq!(radar_path(0), "/radar0");
        assert_eq!(radar_path(12), "/radar12");
    }

    #[test]
    fn test_weather_attenuation_increases_with_intensity() {
        let clear = WeatherState::new(Weather::Clear, false);
        let light = WeatherState::new(Weather::LightRain, false);
        let heavy = WeatherState::new(Weather::HeavyRain, false);
        let fog = WeatherState::new(Weather::HeavyRain, true);

        assert_eq!(clear.attenuation_db_per_km(), 0.0);
        assert!(light.attenuation_db_per_km() > clear.attenuation_db_per_km());
        assert!(heavy.attenuation_db_per_km() > light.attenuation_db_per_km());
        assert!(fog.attenuation_db_per_km() > heavy.attenuation_db_per_km());

        assert!(clear.rain_profile().is_none());
        let (_, _, light_drops) = light.rain_profile().unwrap();
        let (lo, hi, fog_drops) = fog.rain_profile().unwrap();
        assert!(fog_drops > light_drops);
        assert!(lo < hi);
    }

    #[test]
    fn test_position_bearing_and_range() {
        let origin = Position::new(0.0, 0.0, 0.0);
        assert!((origin.bearing_deg_to(&Position::new(0.0, 100.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((origin.bearing_deg_to(&Position::new(100.0, 0.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((origin.bearing_deg_to(&Position::new(0.0, -100.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((origin.bearing_deg_to(&Position::new(-100.0, 0.0, 0.0)) - 270.0).abs() < 1e-9);

        let p = Position::new(3.0, 4.0, 12.0);
        assert!((origin.horizontal_range_to(&p) - 5.0).abs() < 1e-9);
        assert_eq!(origin.offset(3.0, 4.0, 12.0), p);
    }

    #[test]
    fn test_sim_time_advance() {
        let mut time = SimTime::default();
        for _ in 0..crate::constants::TICK_RATE {
            time.advance();
        }
        assert_eq!(time.tick, crate::constants::TICK_RATE as u64);
        assert!((time.elapsed_secs - 1.0).abs() < 1e-9);
    }
}
