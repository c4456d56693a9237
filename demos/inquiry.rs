//! Broadcast one SADP inquiry and print every device that answers.
//!
//! Usage: `sudo inquiry [config.json]`. Needs CAP_NET_RAW. Ctrl-C stops the
//! capture once the next frame arrives.

use sadp_link::config::SadpConfig;
use sadp_link::logging::{self, ConsoleLogger, LogLevel, SadpLogger};
use sadp_link::{CaptureDaemon, PacketEvent, PacketListener, PacketType, RawTransport, Result};
use std::sync::Arc;

struct PrintListener {
    logger: Arc<dyn SadpLogger>,
}

impl PacketListener for PrintListener {
    fn on_packet_received(&self, event: &PacketEvent<'_>) -> Result<()> {
        let kind = match event.frame.packet_type() {
            PacketType::Response => "response",
            PacketType::Request => "request",
            PacketType::Unknown => "unknown",
        };
        self.logger.log(
            LogLevel::Info,
            "Main",
            &format!(
                "Received a packet ({} {}) from {} / {}",
                event.query_label(),
                kind,
                event.header.source,
                event.frame.source_ip
            ),
        );
        Ok(())
    }
}

fn main() {
    logging::init();
    let logger: Arc<dyn SadpLogger> = ConsoleLogger::new();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "sadp.json".to_string());
    logger.log(LogLevel::Info, "Main", &format!("Loading config from {}", config_path));

    let config = match SadpConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            logger.log(LogLevel::Error, "Main", &format!("{}", e));
            std::process::exit(1);
        }
    };

    let transport = match config.identity().and_then(|id| RawTransport::new(id).map_err(Into::into)) {
        Ok(t) => t,
        Err(e) => {
            logger.log(LogLevel::Error, "Main", &format!("Cannot open raw socket: {}", e));
            std::process::exit(1);
        }
    };

    let daemon = CaptureDaemon::from_config(Arc::new(transport), &config).with_logger(logger.clone());
    daemon.add_listener(Some(Arc::new(PrintListener { logger: logger.clone() })));

    let stop = daemon.stop_handle();
    let l = logger.clone();
    ctrlc::set_handler(move || {
        l.log(LogLevel::Info, "Main", "Shutting down after the next frame...");
        stop.stop();
    })
    .ok();

    daemon.start();
    if let Err(e) = daemon.send_inquiry() {
        logger.log(LogLevel::Error, "Main", &format!("{}", e));
    }
    daemon.run();
}
