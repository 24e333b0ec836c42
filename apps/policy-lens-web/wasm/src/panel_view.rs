//! Results panel on the live page

use crate::web_dom::WebDom;
use page_dom::locate::PANEL_ROOT_ID;
use page_dom::panel::{card_index, CARD_CLASS, CARD_INDEX_ATTR, CLOSE_BUTTON_CLASS};
use page_dom::{highlight_issue, remove_highlights, IssuePanel};
use shared_types::AnalysisResult;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement};

/// Show `result` in the floating panel. A panel that is already open is
/// made visible again instead of being duplicated.
pub fn show_panel(document: &Document, result: &AnalysisResult) -> Result<(), JsValue> {
    if let Some(existing) = document.get_element_by_id(PANEL_ROOT_ID) {
        ensure_visible(&existing)?;
        return Ok(());
    }

    let body = document.body().ok_or("No body")?;
    let model = Rc::new(RefCell::new(IssuePanel::from_result(result)));

    let panel = document.create_element("div")?;
    panel.set_id(PANEL_ROOT_ID);
    panel.set_class_name("privacy-analysis-panel floating");
    panel.set_inner_html(&model.borrow().render_html());

    attach_close(document, &panel)?;
    attach_cards(document, &panel, &model)?;
    body.append_child(&panel)?;
    Ok(())
}

fn ensure_visible(panel: &Element) -> Result<(), JsValue> {
    if let Some(panel) = panel.dyn_ref::<HtmlElement>() {
        let style = panel.style();
        style.set_property("display", "block")?;
        style.set_property("visibility", "visible")?;
        style.set_property("opacity", "1")?;
    }
    Ok(())
}

fn attach_close(document: &Document, panel: &Element) -> Result<(), JsValue> {
    let Some(button) = panel.query_selector(&format!(".{}", CLOSE_BUTTON_CLASS))? else {
        return Ok(());
    };

    let document = document.clone();
    let panel = panel.clone();
    let on_close = Closure::wrap(Box::new(move |_event: Event| {
        panel.remove();
        remove_highlights(&mut WebDom::new(document.clone()));
    }) as Box<dyn FnMut(_)>);

    button.add_event_listener_with_callback("click", on_close.as_ref().unchecked_ref())?;
    on_close.forget();
    Ok(())
}

fn attach_cards(
    document: &Document,
    panel: &Element,
    model: &Rc<RefCell<IssuePanel>>,
) -> Result<(), JsValue> {
    let cards = panel.query_selector_all(&format!(".{}", CARD_CLASS))?;

    for i in 0..cards.length() {
        let Some(card) = cards.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(index) = card.get_attribute(CARD_INDEX_ATTR).as_deref().and_then(card_index) else {
            continue;
        };

        let document = document.clone();
        let model = Rc::clone(model);
        let on_click = Closure::wrap(Box::new(move |event: Event| {
            event.stop_propagation();
            let issue = model.borrow_mut().select(index).cloned();
            let Some(issue) = issue else {
                return;
            };
            let outcome = highlight_issue(&mut WebDom::new(document.clone()), &issue);
            if !outcome.placed() {
                web_sys::console::warn_1(
                    &format!("Could not find \"{}\" on the page", issue.matched_text).into(),
                );
            }
        }) as Box<dyn FnMut(_)>);

        card.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }
    Ok(())
}
