use std::io::Read as _;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const PASSWORD: &str = "correct horse";

/// A tiny forum serving three listing pages, two item pages and a login form.
pub struct ForumStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ForumStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start forum stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                seen.lock().expect("lock request log").push(url.clone());

                if request.method() == &tiny_http::Method::Post {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let response = if url == "/login" && body.contains("pw=correct+horse") {
                        let location =
                            tiny_http::Header::from_bytes(&b"Location"[..], &b"news"[..])
                                .expect("build header");
                        tiny_http::Response::from_string("").with_status_code(302).with_header(location)
                    } else {
                        tiny_http::Response::from_string("Bad login.").with_status_code(200)
                    };
                    let _ = request.respond(response);
                    continue;
                }

                let (status, body) = match url.as_str() {
                    "/" => (200, listing(&[8, 7, 6], Some("news?p=2"))),
                    "/news?p=2" => (200, listing(&[5, 4, 3], Some("news?p=3"))),
                    "/news?p=3" => (200, listing(&[2, 1], None)),
                    "/upvoted?id=jay" => (200, listing(&[42], None)),
                    "/item?id=100" => (
                        200,
                        discussion(&[(11, 0, 2), (12, 40, 1), (13, 80, 0), (14, 0, 1), (15, 40, 0)]),
                    ),
                    "/item?id=200" => (200, discussion(&[(21, 0, 1), (22, 80, 0)])),
                    _ => (404, "not found".to_owned()),
                };

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"text/html; charset=utf-8"[..],
                )
                .expect("build header");
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock request log").clone()
    }
}

impl Drop for ForumStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn listing(ids: &[u64], more: Option<&str>) -> String {
    let mut rows = String::new();
    for id in ids {
        rows.push_str(&format!(
            r#"<tr class="athing submission" id="{id}">
  <td class="title"><span class="titleline"><a href="https://example.com/{id}">Story {id}</a></span></td>
</tr>
<tr><td class="subtext">
  <span class="score">{id}0 points</span> by <a href="user?id=poster{id}" class="hnuser">poster{id}</a>
  <span class="age"><a href="item?id={id}">{id} hours ago</a></span> | <a href="item?id={id}">{id}&nbsp;comments</a>
</td></tr>
"#
        ));
    }
    let more = match more {
        Some(href) => format!(r#"<a href="{href}" class="morelink" rel="next">More</a>"#),
        None => String::new(),
    };
    format!("<!doctype html><html><body><table>{rows}</table>{more}</body></html>")
}

fn discussion(comments: &[(u64, u32, u32)]) -> String {
    let mut rows = String::new();
    for (id, width, n) in comments {
        rows.push_str(&format!(
            r#"<tr class="athing comtr" id="{id}"><td><table><tr>
<td class="ind"><img src="s.gif" height="1" width="{width}"></td>
<td class="default"><span class="comhead"><a href="user?id=c{id}" class="hnuser">c{id}</a>
<span class="age"><a href="item?id={id}">1 day ago</a></span>
<a class="togg" n="{n}" href="javascript:void(0)"></a></span>
<div class="comment"><span class="commtext c00">Comment {id}</span></div>
</td></tr></table></td></tr>
"#
        ));
    }
    format!(
        "<!doctype html><html><body><table class=\"comment-tree\">{rows}</table></body></html>"
    )
}
