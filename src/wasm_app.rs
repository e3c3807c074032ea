use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use js_sys::{Reflect, Uint8Array};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, HtmlAnchorElement, HtmlInputElement, HtmlTableRowElement,
    HtmlTableSectionElement, ReadableStreamDefaultReader, Response,
};

use crate::columns::{Cell, CellContent};
use crate::config::TableConfig;
use crate::constants::{
    FEED_URL_META, SHOW_GAME_COLUMN_FLAG, SHOW_ROUTE_COLUMN_FLAG, TABLE_BODY_ID,
};
use crate::error::IngestError;
use crate::filter::FilterMode;
use crate::ingest::FeedDecoder;
use crate::models::{Field, ReplayRecord};
use crate::table::{Scheduled, TableController, TableSink};

const FILTER_CONTROL_SELECTOR: &str = "[filtertype]";
const CHECKBOX_CONTROL_SELECTOR: &str = "input[type=checkbox][filtertype]";
const PRESSED_CLASS: &str = "pressed";

struct DomSink {
    document: Document,
    table_body: Option<HtmlTableSectionElement>,
}

impl TableSink for DomSink {
    fn clear(&mut self) {
        if let Some(table_body) = &self.table_body {
            table_body.set_inner_html("");
        }
    }

    fn append_rows(&mut self, rows: &[Vec<Cell>]) {
        let table_body = match &self.table_body {
            Some(body) => body,
            None => return,
        };
        let fragment = self.document.create_document_fragment();
        for cells in rows {
            match build_row(&self.document, cells) {
                Ok(tr) => {
                    let _ = fragment.append_child(&tr);
                }
                Err(err) => warn!(
                    error = %js_error_message(err, "row creation failed"),
                    "dropped replay row"
                ),
            }
        }
        let _ = table_body.append_child(&fragment);
    }

    fn show_error(&mut self, message: &str) {
        let table_body = match &self.table_body {
            Some(body) => body,
            None => return,
        };
        table_body.set_inner_html("");
        if let Ok(notice) = self.document.create_element("p") {
            let _ = notice.set_attribute("style", "color: red;");
            notice.set_text_content(Some(message));
            let _ = table_body.append_child(&notice);
        }
    }
}

struct AppState {
    document: Document,
    controller: TableController<DomSink>,
    feed_url: String,
    batch_delay_ms: u32,
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn read_page_flag(window: &web_sys::Window, name: &str) -> Option<bool> {
    Reflect::get(window, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_bool())
}

fn read_feed_override(document: &Document) -> Option<String> {
    let meta = document.query_selector(FEED_URL_META).ok().flatten()?;
    meta.get_attribute("content")
}

fn read_config(window: &web_sys::Window, document: &Document) -> TableConfig {
    let location = window.location();
    let origin = location.origin().unwrap_or_default();
    let pathname = location.pathname().unwrap_or_else(|_| "/".to_string());
    TableConfig::from_page(
        &origin,
        &pathname,
        read_feed_override(document).as_deref(),
        read_page_flag(window, SHOW_GAME_COLUMN_FLAG),
        read_page_flag(window, SHOW_ROUTE_COLUMN_FLAG),
    )
}

fn detect_filter_mode(document: &Document) -> FilterMode {
    match document.query_selector(CHECKBOX_CONTROL_SELECTOR) {
        Ok(Some(_)) => FilterMode::Multi,
        _ => FilterMode::Single,
    }
}

fn filter_controls(document: &Document) -> Vec<Element> {
    let mut controls = Vec::new();
    if let Ok(nodes) = document.query_selector_all(FILTER_CONTROL_SELECTOR) {
        for index in 0..nodes.length() {
            if let Some(node) = nodes.item(index) {
                if let Ok(element) = node.dyn_into::<Element>() {
                    controls.push(element);
                }
            }
        }
    }
    controls
}

fn control_field(control: &Element) -> Option<Field> {
    let name = control.get_attribute("filtertype")?;
    let field = Field::parse(&name);
    if field.is_none() {
        warn!(filtertype = %name, "filter control names an unknown field");
    }
    field
}

fn control_value(control: &Element) -> Option<String> {
    if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    control.get_attribute("value")
}

fn control_is_active(control: &Element) -> bool {
    match control.dyn_ref::<HtmlInputElement>() {
        Some(input) => input.checked(),
        None => control.class_list().contains(PRESSED_CLASS),
    }
}

fn build_anchor(document: &Document, text: &str, url: &str) -> Result<HtmlAnchorElement, JsValue> {
    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(JsValue::from)?;
    anchor.set_href(url);
    anchor.set_text_content(Some(text));
    Ok(anchor)
}

/// A link that cannot become an anchor still shows its text, so the row keeps
/// one cell per column.
fn build_cell(document: &Document, cell: &Cell) -> Result<Element, JsValue> {
    let td = document.create_element("td")?;
    if let Some(class) = cell.class {
        td.set_class_name(class);
    }
    match &cell.content {
        CellContent::Link(link) => match build_anchor(document, &link.text, &link.url) {
            Ok(anchor) => {
                td.append_child(&anchor)?;
            }
            Err(err) => {
                warn!(
                    field = %cell.field,
                    error = %js_error_message(err, "anchor creation failed"),
                    "rendering link cell as text"
                );
                td.set_text_content(Some(cell.text()));
            }
        },
        CellContent::Text(text) => td.set_text_content(Some(text)),
    }
    Ok(td)
}

fn build_row(document: &Document, cells: &[Cell]) -> Result<HtmlTableRowElement, JsValue> {
    let tr = document
        .create_element("tr")?
        .dyn_into::<HtmlTableRowElement>()
        .map_err(JsValue::from)?;
    for cell in cells {
        let td = build_cell(document, cell)?;
        tr.append_child(&td)?;
    }
    Ok(tr)
}

fn update_controls(state: &AppState) {
    for control in filter_controls(&state.document) {
        let (field, value) = match (control_field(&control), control_value(&control)) {
            (Some(field), Some(value)) => (field, value),
            _ => continue,
        };
        let selected = state.controller.is_selected(field, &value);
        match control.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.set_checked(selected),
            None => control.set_class_name(if selected { "button pressed" } else { "button" }),
        }
    }
}

fn arm_batches(state_rc: &Rc<RefCell<AppState>>, scheduled: Scheduled) {
    let delay = state_rc.borrow().batch_delay_ms;
    for _ in 0..scheduled.deferred {
        let state_clone = state_rc.clone();
        let timeout = Timeout::new(delay, move || {
            state_clone.borrow_mut().controller.run_next_batch();
        });
        timeout.forget();
    }
}

fn ingest_and_arm(state_rc: &Rc<RefCell<AppState>>, records: Vec<ReplayRecord>) {
    let scheduled = state_rc.borrow_mut().controller.ingest(records);
    arm_batches(state_rc, scheduled);
}

fn js_error_message(err: JsValue, fallback: &str) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Ok(error) = err.dyn_into::<js_sys::Error>() {
        return error.message().into();
    }
    fallback.to_string()
}

fn transport_error(err: JsValue) -> IngestError {
    IngestError::Transport(js_error_message(err, "Request failed"))
}

async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>, IngestError> {
    let chunk = JsFuture::from(reader.read())
        .await
        .map_err(transport_error)?;
    let done = Reflect::get(&chunk, &JsValue::from_str("done"))
        .map_err(transport_error)?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }
    let value = Reflect::get(&chunk, &JsValue::from_str("value")).map_err(transport_error)?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

async fn stream_feed(state_rc: Rc<RefCell<AppState>>, url: String) -> Result<(), IngestError> {
    let window = window().map_err(transport_error)?;
    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(transport_error)?;
    let response: Response = response.dyn_into().map_err(transport_error)?;
    if !response.ok() {
        return Err(IngestError::Status(response.status()));
    }
    let body = response
        .body()
        .ok_or_else(|| IngestError::Transport("response has no body".to_string()))?;
    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();

    let mut decoder = FeedDecoder::new();
    while let Some(bytes) = read_chunk(&reader).await? {
        let records = decoder.feed(&bytes)?;
        ingest_and_arm(&state_rc, records);
    }
    let records = decoder.finish()?;
    ingest_and_arm(&state_rc, records);
    Ok(())
}

fn start_ingest(state_rc: Rc<RefCell<AppState>>) {
    let url = {
        let mut state = state_rc.borrow_mut();
        state.controller.begin();
        state.feed_url.clone()
    };
    info!(url = %url, "requesting replay feed");

    spawn_local(async move {
        let result = stream_feed(state_rc.clone(), url).await;
        let mut state = state_rc.borrow_mut();
        match result {
            Ok(()) => state.controller.complete(),
            Err(err) => state.controller.fail(&err),
        }
    });
}

fn handle_filter_click(state_rc: &Rc<RefCell<AppState>>, control: &Element) {
    let (field, value) = match (control_field(control), control_value(control)) {
        (Some(field), Some(value)) => (field, value),
        _ => return,
    };
    let scheduled = {
        let mut state = state_rc.borrow_mut();
        let scheduled = state.controller.update_filter(field, &value);
        update_controls(&state);
        scheduled
    };
    debug!(field = %field, value = %value, painted = scheduled.painted, "filter updated");
    arm_batches(state_rc, scheduled);
}

fn resync_filters(state_rc: &Rc<RefCell<AppState>>) {
    let scheduled = {
        let mut state = state_rc.borrow_mut();
        let active: Vec<(Field, String)> = filter_controls(&state.document)
            .iter()
            .filter(|control| control_is_active(control))
            .filter_map(|control| Some((control_field(control)?, control_value(control)?)))
            .collect();
        let scheduled = state.controller.resync_filters(active);
        update_controls(&state);
        scheduled
    };
    arm_batches(state_rc, scheduled);
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let config = read_config(&window, &document);
    let mode = detect_filter_mode(&document);
    let table_body = document
        .get_element_by_id(TABLE_BODY_ID)
        .and_then(|el| el.dyn_into::<HtmlTableSectionElement>().ok());
    if table_body.is_none() {
        warn!(id = TABLE_BODY_ID, "replay table body not found");
    }

    let sink = DomSink {
        document: document.clone(),
        table_body,
    };
    let state = AppState {
        document: document.clone(),
        controller: TableController::new(&config, mode, sink),
        feed_url: config.feed_url.clone(),
        batch_delay_ms: config.batch_delay_ms,
    };
    info!(
        mode = ?state.controller.selection().mode(),
        feed = %state.feed_url,
        "replay table ready"
    );
    let state_rc = Rc::new(RefCell::new(state));
    update_controls(&state_rc.borrow());

    start_ingest(state_rc.clone());

    for control in filter_controls(&document) {
        let state_clone = state_rc.clone();
        let target = control.clone();
        let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            handle_filter_click(&state_clone, &target);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = control.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
        handler.forget();
    }

    let state_clone = state_rc.clone();
    let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        resync_filters(&state_clone);
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = window.add_event_listener_with_callback("pageshow", handler.as_ref().unchecked_ref());
    handler.forget();

    Ok(())
}
