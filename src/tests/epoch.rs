use crate::{
    epoch::utc_from_gregorian,
    prelude::{Duration, Epoch, EpochRecord, Failure, GnssTime, TimeScale, Timestamp},
};

#[test]
fn gnss_time_origin() {
    let origin = GnssTime::from_week_tow(0, 0.0);
    assert_eq!(origin.duration(), Duration::ZERO);
    assert_eq!(
        origin.to_epoch(),
        Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, TimeScale::GPST)
    );

    assert_eq!(utc_from_gregorian(1980, 1, 6, 0, 0, 0, 0), Ok(Duration::ZERO));
}

#[test]
fn week_and_time_of_week() {
    let t = GnssTime::from_week_tow(2300, 345_600.5);
    assert_eq!(t.week_tow(), Some((2300, 345_600.5)));

    let (week, tow) = GnssTime::from_week_tow(2295, 604_799.0).week_tow().unwrap();
    assert_eq!((week, tow), (2295, 604_799.0));

    assert_eq!(GnssTime::default().week_tow(), Some((0, 0.0)));

    // no week counter before the GPS origin
    let before = GnssTime::from_duration(-Duration::from_seconds(1.0));
    assert_eq!(before.week_tow(), None);
}

#[test]
fn civil_utc_to_gnss_time() {
    let utc = utc_from_gregorian(2024, 1, 1, 0, 0, 0, 0).unwrap();
    assert_eq!(utc, Duration::from_seconds(1_388_102_400.0));

    // 2024-01-01 is a monday: one day + 18s into week 2295
    let t = GnssTime::from_utc(utc, 18);
    assert_eq!(t.week_tow(), Some((2295, 86_418.0)));
    assert_eq!(t.to_utc(18), utc);

    // agrees with the leap second table
    let reference = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
    assert_eq!(GnssTime::from_epoch(reference), t);
}

#[test]
fn invalid_civil_dates() {
    for (y, m, d) in [(2024, 13, 1), (2023, 2, 30), (2024, 0, 10)] {
        match utc_from_gregorian(y, m, d, 0, 0, 0, 0) {
            Err(Failure::Malformed(_)) => {},
            other => panic!("{}-{}-{}: unexpected {:?}", y, m, d, other),
        }
    }
}

#[test]
fn timestamp_resolution() {
    let utc = utc_from_gregorian(2024, 6, 1, 12, 0, 0, 0).unwrap();

    let t = Timestamp::Utc(utc).resolve(18);
    assert_eq!(t.duration(), utc + Duration::from_seconds(18.0));

    // GNSS time tags ignore the leap offset
    let gnss = GnssTime::from_week_tow(2300, 10.0);
    assert_eq!(Timestamp::Gnss(gnss).resolve(18), gnss);
    assert_eq!(Timestamp::Gnss(gnss).resolve(0), gnss);
}

#[test]
fn record_serdes() {
    let record = EpochRecord {
        time: GnssTime::from_week_tow(2300, 1.0),
        leap_seconds: 18,
        cep_m: 2.5,
        ..Default::default()
    };

    let json = serde_json::to_string(&record).unwrap();
    let parsed: EpochRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
}
