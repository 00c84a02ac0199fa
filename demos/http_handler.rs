use std::sync::Arc;

use chrome_console_log::env::development_from_env;
use chrome_console_log::settings::Settings;
use chrome_console_log::{console, Composite, ConsoleLogger, Member, RequestHost, HEADER_NAME};
use http::{Request, Response, StatusCode};

/// Stand-in for an application object worth inspecting in the console.
struct Cart {
    owner: String,
    items: Vec<&'static str>,
}

impl Composite for Cart {
    fn members(&self) -> Vec<Member> {
        vec![
            Member::public("owner", self.owner.as_str()),
            Member::private("items", self.items.clone()),
        ]
    }
}

fn handle(request: Request<()>) -> Response<String> {
    let host = RequestHost::from_request(&request, development_from_env());
    let mut console = ConsoleLogger::with_settings(host, Settings::from_env());

    let cart = Arc::new(Cart {
        owner: "ada".to_string(),
        items: vec!["tea", "scones"],
    });

    console!(console, group, "checkout");
    console!(console, info, "cart loaded", &cart);
    console!(console, warn, "stock low", "scones");
    console!(console, group_end);

    let mut response = Response::new("ok".to_string());
    *response.status_mut() = StatusCode::OK;
    if let Some(headers) = console.into_host().into_sink() {
        response.headers_mut().extend(headers);
    }
    response
}

fn main() {
    std::env::set_var("CHROME_LOGGER_CONTEXT", "Development");

    let request = Request::get("http://localhost:8080/checkout")
        .body(())
        .expect("static request");
    let response = handle(request);

    match response.headers().get(HEADER_NAME) {
        Some(value) => println!("{}: {} bytes", HEADER_NAME, value.len()),
        None => println!("no console header (not a development context)"),
    }
}
