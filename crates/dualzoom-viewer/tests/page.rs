use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use dualzoom_core::{Polygon, Style};
use dualzoom_io::{spawn_connectivity_check, DziDescriptor, Health, HttpFetcher, StorageConfig};
use dualzoom_renderer::{rasterize, OverlayRenderer, SurfaceSize};
use dualzoom_viewer::{AppConfig, Bootstrapper, HeadlessEngine, PanelState, StatusClass};

/// Loopback server answering `count` requests by path; unknown paths get 404.
fn serve_routes(count: usize, routes: HashMap<String, (u16, Vec<u8>)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut paths = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let path = request_path(&mut stream);
            let (status, body) = routes.get(&path).cloned().unwrap_or((404, b"NoSuchKey".to_vec()));
            let head = format!(
                "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            paths.push(path);
        }
        paths
    });
    (format!("http://{}", addr), handle)
}

fn request_path(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.split_whitespace().nth(1).unwrap_or("/").to_string()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let square = Polygon::from_pairs(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap();
    rasterize(&square, &Style::default(), SurfaceSize::new(width, height))
        .unwrap()
        .encode_png()
        .unwrap()
}

#[test]
fn test_unhealthy_storage_does_not_block_panels() {
    let mut routes = HashMap::new();
    routes.insert("/minio/health/live".to_string(), (503, Vec::new()));
    routes.insert(
        "/images/sample1.dzi".to_string(),
        (200, DziDescriptor::new(1000, 800, 254, 1, "jpg").to_xml().into_bytes()),
    );
    routes.insert("/images/sample2.jpg".to_string(), (200, png(64, 48)));
    let (endpoint, server) = serve_routes(3, routes);

    let config = AppConfig::for_storage(StorageConfig::new(&endpoint, "images"));
    let probe = spawn_connectivity_check(config.storage.clone());

    let mut boot = Bootstrapper::new(
        HeadlessEngine::new(HttpFetcher::default()),
        OverlayRenderer::new(config.surface),
    );
    for spec in config.panels.clone() {
        boot.add_panel(spec);
    }
    boot.run();

    assert_eq!(probe.join().unwrap(), Health::Degraded { status: 503 });
    for panel in boot.panels() {
        assert_eq!(panel.state(), PanelState::Loaded);
        assert_eq!(panel.status.class, StatusClass::Success);
        assert_eq!(panel.overlays().len(), 2);
    }

    let mut paths = server.join().unwrap();
    paths.sort();
    assert_eq!(
        paths,
        vec!["/images/sample1.dzi", "/images/sample2.jpg", "/minio/health/live"]
    );
}

#[test]
fn test_missing_objects_fail_each_panel_with_its_message() {
    let mut routes = HashMap::new();
    routes.insert("/minio/health/live".to_string(), (200, Vec::new()));
    let (endpoint, server) = serve_routes(3, routes);

    let config = AppConfig::for_storage(StorageConfig::new(&endpoint, "images"));
    let probe = spawn_connectivity_check(config.storage.clone());

    let mut boot = Bootstrapper::new(HeadlessEngine::new(HttpFetcher::default()), OverlayRenderer::default());
    for spec in config.panels.clone() {
        boot.add_panel(spec);
    }
    boot.run();

    assert!(probe.join().unwrap().is_healthy());
    let statuses: Vec<_> = boot.panels().iter().map(|p| p.status.text.clone()).collect();
    assert_eq!(
        statuses,
        vec![
            "Failed to load DZI. Check if image processing completed.",
            "Failed to load regular image from MinIO.",
        ]
    );
    assert!(boot
        .panels()
        .iter()
        .all(|p| p.handle().unwrap().overlays().is_empty()));
    server.join().unwrap();
}
