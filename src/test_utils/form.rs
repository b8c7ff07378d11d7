use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let hx_attribute = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        hx_attribute, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {hx_attribute:?}"
    );
}

/// Assert that `form` has a select element called `name` whose options are
/// `want_options` (by value, in order) and that `want_selected` is selected.
#[track_caller]
pub(crate) fn assert_form_select(
    form: &ElementRef<'_>,
    name: &str,
    want_options: &[&str],
    want_selected: &str,
) {
    let select = form
        .select(&Selector::parse(&format!("select[name=\"{name}\"]")).unwrap())
        .next()
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    let options = select
        .select(&Selector::parse("option").unwrap())
        .collect::<Vec<_>>();
    let got_options = options
        .iter()
        .map(|option| option.value().attr("value").unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(
        want_options, got_options,
        "want options {want_options:?} for select \"{name}\", got {got_options:?}"
    );

    let got_selected = options
        .iter()
        .filter(|option| option.value().attr("selected").is_some())
        .map(|option| option.value().attr("value").unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(
        got_selected,
        vec![want_selected],
        "want exactly \"{want_selected}\" selected for select \"{name}\", got {got_selected:?}"
    );
}
