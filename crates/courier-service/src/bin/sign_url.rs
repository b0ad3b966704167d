use courier_core::config::load_config;
use courier_core::constants::DOWNLOAD_ROUTE_PREFIX;
use courier_service::request::params::{DownloadParams, signed_query};

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("Usage: sign_url <url> [filename] [expire]");
        std::process::exit(2);
    };
    let params = DownloadParams {
        url,
        filename: args.next().filter(|v| !v.is_empty()),
        expire: args.next().filter(|v| !v.is_empty()),
    };

    match load_config() {
        Ok(settings) => {
            if settings.download.is_open_mode() {
                eprintln!("No sign key configured; printing an unsigned link");
            }
            let query = signed_query(&params, &settings.download.sign_key);
            println!("{DOWNLOAD_ROUTE_PREFIX}?{query}");
        }
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    }
}
