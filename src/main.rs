// src/main.rs
mod annotation;
mod app_config;
mod backend;
mod compare;
mod components;
mod error;
mod geometry;
mod render;
mod report;
mod store;
mod utils;
mod wire;

use annotation::PageId;
use app_config::AppConfig;
use backend::memory::MemoryBackend;
use backend::rest::RestBackend;
use backend::BackendHandle;
use compare::ComparePair;
use components::compare_view::CompareView;
use components::proof_viewer::ProofViewer;
use error::ProofError;
use gloo_net::http::Request;
use utils::resource_url;
use yew::prelude::*;

pub enum AppMsg {
    ChangePage(PageId),
    CompareWith(Option<PageId>),
    ConfigLoaded(AppConfig),
    ConfigLoadFailed(ProofError),
}

pub struct App {
    config: Option<AppConfig>,
    backend: Option<BackendHandle>,
    current_page: Option<PageId>,
    compare_with: Option<PageId>,
    loading: bool,
    error: Option<String>,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match load_config().await {
                Ok(config) => AppMsg::ConfigLoaded(config),
                Err(e) => AppMsg::ConfigLoadFailed(e),
            }
        });

        Self {
            config: None,
            backend: None,
            current_page: None,
            compare_with: None,
            loading: true,
            error: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::ChangePage(page) => {
                if self.compare_with.as_ref() == Some(&page) {
                    self.compare_with = None;
                }
                self.current_page = Some(page);
                true
            }
            AppMsg::CompareWith(page) => {
                self.compare_with = page;
                true
            }
            AppMsg::ConfigLoaded(config) => {
                let backend = match &config.backend {
                    Some(settings) => {
                        log::info!("Using hosted backend at {}", settings.url);
                        BackendHandle::new(RestBackend::new(settings.clone()))
                    }
                    None => {
                        log::warn!("No backend configured; annotations live in memory only");
                        BackendHandle::new(MemoryBackend::new())
                    }
                };
                self.current_page = config.pages.first().map(|p| p.id.clone());
                self.backend = Some(backend);
                self.config = Some(config);
                self.loading = false;
                true
            }
            AppMsg::ConfigLoadFailed(error) => {
                log::error!("Failed to load config: {}", error);
                self.error = Some(error.to_string());
                self.loading = false;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let (config, backend) = match (&self.config, &self.backend) {
            (Some(config), Some(backend)) => (config, backend),
            _ => {
                let body = if self.loading {
                    html! { <div class="loading">{"Loading pages..."}</div> }
                } else {
                    let message = self.error.clone().unwrap_or_default();
                    html! { <div class="error">{format!("Could not start: {}", message)}</div> }
                };
                return html! {
                    <div class="app-container">
                        <header class="app-header">
                            <h1>{"Proof Viewer"}</h1>
                        </header>
                        <main class="app-main">{body}</main>
                    </div>
                };
            }
        };

        let Some(page) = self
            .current_page
            .as_ref()
            .and_then(|id| config.get_page(id))
            .cloned()
        else {
            return html! { <div class="error">{"No page selected"}</div> };
        };

        let on_page_change = ctx.link().callback(AppMsg::ChangePage);
        let on_compare_change = ctx.link().callback(AppMsg::CompareWith);

        let compare_pair = self
            .compare_with
            .as_ref()
            .and_then(|id| config.get_page(id))
            .map(|revised| ComparePair::new(page.clone(), revised.clone()));

        html! {
            <div class="app-container">
                <header class="app-header">
                    <h1>{config.title.clone()}</h1>
                    if config.is_offline() {
                        <p class="subtitle">{"Offline: annotations are not saved"}</p>
                    }
                </header>

                <main class="app-main">
                    <div class="selectors-container">
                        <div class="page-selector">
                            <label for="page-select">{"Page: "}</label>
                            <select
                                id="page-select"
                                onchange={
                                    let on_change = on_page_change.clone();
                                    Callback::from(move |e: Event| {
                                        let target = e.target_dyn_into::<web_sys::HtmlSelectElement>();
                                        if let Some(select) = target {
                                            on_change.emit(PageId(select.value()));
                                        }
                                    })
                                }
                            >
                                {for config.pages.iter().map(|info| {
                                    html! {
                                        <option
                                            value={info.id.to_string()}
                                            selected={info.id == page.id}
                                        >
                                            {info.display_label()}
                                        </option>
                                    }
                                })}
                            </select>
                        </div>

                        <div class="compare-selector">
                            <label for="compare-select">{"Compare with: "}</label>
                            <select
                                id="compare-select"
                                onchange={
                                    let on_change = on_compare_change.clone();
                                    Callback::from(move |e: Event| {
                                        let target = e.target_dyn_into::<web_sys::HtmlSelectElement>();
                                        if let Some(select) = target {
                                            let value = select.value();
                                            on_change.emit((!value.is_empty()).then(|| PageId(value)));
                                        }
                                    })
                                }
                            >
                                <option value="" selected={self.compare_with.is_none()}>{"(annotate)"}</option>
                                {for config.pages.iter().filter(|info| info.id != page.id).map(|info| {
                                    html! {
                                        <option
                                            value={info.id.to_string()}
                                            selected={self.compare_with.as_ref() == Some(&info.id)}
                                        >
                                            {info.display_label()}
                                        </option>
                                    }
                                })}
                            </select>
                        </div>
                    </div>

                    if let Some(pair) = compare_pair {
                        <CompareView {pair} />
                    } else {
                        <ProofViewer backend={backend.clone()} page={page.clone()} />
                    }
                </main>
            </div>
        }
    }
}

async fn load_config() -> Result<AppConfig, ProofError> {
    let url = resource_url("public/config.json");
    let resp = Request::get(&url).send().await?;
    if !resp.ok() {
        return Err(ProofError::Config(format!(
            "{} returned HTTP {}",
            url,
            resp.status()
        )));
    }
    let text = resp.text().await?;
    let config = AppConfig::from_json(&text)?;
    log::info!("Loaded config with {} pages", config.pages.len());
    Ok(config)
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
