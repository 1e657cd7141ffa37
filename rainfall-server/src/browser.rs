use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// URL of the landing page for a bound listener. Wildcard binds are opened
/// through loopback.
pub fn landing_url(addr: SocketAddr) -> String {
    let host = if addr.ip().is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        addr.ip()
    };

    format!("http://{}/", SocketAddr::new(host, addr.port()))
}

/// Open the landing page in the default browser without blocking startup.
/// Failure is logged and otherwise ignored.
pub fn open_in_background(addr: SocketAddr) {
    let url = landing_url(addr);

    tokio::task::spawn_blocking(move || match webbrowser::open(&url) {
        Ok(()) => tracing::info!(%url, "opened browser"),
        Err(e) => tracing::warn!(%url, error = %e, "could not open browser"),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_bind_is_used_as_is() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(landing_url(addr), "http://127.0.0.1:5000/");
    }

    #[test]
    fn wildcard_bind_opens_loopback() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(landing_url(addr), "http://127.0.0.1:8080/");
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let addr: SocketAddr = "[::1]:9000".parse().unwrap();
        assert_eq!(landing_url(addr), "http://[::1]:9000/");
    }
}
