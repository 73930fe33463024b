use skycast_core::{DashboardState, ReadingView, SearchHistory, TimeLocale};

const EMPTY_HISTORY: &str = "No searches yet";

/// Full dashboard: error line, weather card, history panel.
pub fn dashboard(state: &DashboardState, locale: &TimeLocale) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        out.push_str(&format!("! {error}\n\n"));
    }

    if let Some(reading) = &state.reading {
        out.push_str(&card(&ReadingView::new(reading, locale)));
        out.push('\n');
    }

    out.push_str(&history(&state.history));
    out
}

pub fn card(view: &ReadingView) -> String {
    let condition = [view.icon.as_str(), view.condition.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{location}\n\
         {temperature}\n\
         {condition}\n\
         💧 {humidity}   💨 {wind}\n\
         Sunrise 🌅: {sunrise}   Sunset 🌇: {sunset}\n",
        location = view.location,
        temperature = view.temperature,
        humidity = view.humidity,
        wind = view.wind,
        sunrise = view.sunrise,
        sunset = view.sunset,
    )
}

pub fn history(history: &SearchHistory) -> String {
    let mut out = String::from("History\n");
    if history.is_empty() {
        out.push_str(&format!("  {EMPTY_HISTORY}\n"));
        return out;
    }

    for (i, city) in history.iter().enumerate() {
        out.push_str(&format!("  {}. {city}\n", i + 1));
    }
    out
}
