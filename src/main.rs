/*
 * KINEMATIC-RX is part of the nav-solutions framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al,
 * (cf. https://github.com/nav-solutions/kinematic-rx/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/nav-solutions/kinematic-rx
 */

use env_logger::{Builder, Target};

use log::{error, info};

use tokio::{
    signal,
    sync::{mpsc, watch},
};

use kinematic_rx::prelude::EpochRecord;

mod cli;

use crate::cli::Cli;

/// Reports one committed epoch
fn report(label: &str, record: &EpochRecord, json: bool) {
    if json {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("{} - failed to serialize epoch: {}", label, e),
        }
    } else {
        let (lat, lon, height) = record.position.to_geodetic();
        let (week, tow) = record.time.week_tow().unwrap_or_default();

        info!(
            "{} - {} (week={} tow={:.3}s) lat={:.8}° lon={:.8}° h={:.3}m speed={:.3}m/s cep={:.3}m",
            label,
            record.time,
            week,
            tow,
            lat,
            lon,
            height,
            record.velocity.speed(),
            record.cep_m,
        );
    }
}

#[tokio::main]
pub async fn main() {
    let mut builder = Builder::from_default_env();

    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    // cli
    let cli = Cli::new();
    let json = cli.json();
    let settings = cli.settings();

    let mut session = match settings.open() {
        Ok(session) => session,
        Err(e) => {
            error!("{} - failed to deploy: {}", settings.label, e);
            std::process::exit(1);
        },
    };

    let label = session.label().to_string();

    info!(
        "{} - {} receiver deployed",
        label,
        session.receiver().describe()
    );

    // shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // epochs channel
    let (tx, mut rx) = mpsc::channel::<EpochRecord>(128);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(_) => {
                let _ = shutdown_tx.send(true);
            },
            Err(e) => error!("signal handling error: {}", e),
        }
    });

    // the session blocks on its source: runs on a dedicated thread
    let acquisition = tokio::task::spawn_blocking(move || {
        while !*shutdown_rx.borrow() {
            if session.advance_epoch() {
                if let Some(record) = session.current_epoch() {
                    if tx.blocking_send(record).is_err() {
                        break;
                    }
                }
            } else if session.is_exhausted() {
                break;
            }
        }
        (session.accepted(), session.last_failure().cloned())
    });

    while let Some(record) = rx.recv().await {
        report(&label, &record, json);
    }

    match acquisition.await {
        Ok((accepted, failure)) => {
            match failure {
                Some(failure) => info!("{} - {} epochs - {}", label, accepted, failure),
                None => info!("{} - {} epochs", label, accepted),
            }
        },
        Err(e) => error!("{} - acquisition task failure: {}", label, e),
    }
}
