//! Server-rendered pages for the two presentation adapters
//!
//! Both pages render the same widget set. The form page submits to
//! `/predict` and is re-rendered with the outcome; the dashboard posts the
//! current widget values to `/api/estimate` and updates its results panel
//! in place.

use estimator_lib::{Estimate, RawFields};
use maud::{html, Markup, PreEscaped, DOCTYPE};

const YES_NO: &[&str] = &["yes", "no"];
const FURNISHING: &[&str] = &["furnished", "semi-furnished", "unfurnished"];

/// An input widget bound to one property attribute
pub enum Widget {
    Number {
        name: &'static str,
        label: &'static str,
        min: &'static str,
        max: Option<&'static str>,
        step: &'static str,
        default: &'static str,
    },
    Radio {
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    },
    Select {
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    },
}

impl Widget {
    pub fn name(&self) -> &'static str {
        match self {
            Widget::Number { name, .. } | Widget::Radio { name, .. } | Widget::Select { name, .. } => {
                *name
            }
        }
    }

    /// Value shown before the user changes anything
    pub fn default_value(&self) -> &'static str {
        match self {
            Widget::Number { default, .. } => *default,
            Widget::Radio { options, .. } | Widget::Select { options, .. } => options[0],
        }
    }
}

/// Widgets grouped into the three columns of the input panel
pub const SECTIONS: &[(&str, &[Widget])] = &[
    (
        "Property Dimensions",
        &[
            Widget::Number {
                name: "area",
                label: "Area (in square feet)",
                min: "1",
                max: None,
                step: "100",
                default: "5000",
            },
            Widget::Number {
                name: "bedrooms",
                label: "Number of Bedrooms",
                min: "1",
                max: Some("10"),
                step: "1",
                default: "3",
            },
            Widget::Number {
                name: "bathrooms",
                label: "Number of Bathrooms",
                min: "1",
                max: Some("5"),
                step: "1",
                default: "2",
            },
        ],
    ),
    (
        "Key Features",
        &[
            Widget::Number {
                name: "stories",
                label: "Number of Stories",
                min: "1",
                max: Some("5"),
                step: "1",
                default: "1",
            },
            Widget::Number {
                name: "parking",
                label: "Parking Spaces",
                min: "0",
                max: Some("5"),
                step: "1",
                default: "1",
            },
            Widget::Radio {
                name: "mainroad",
                label: "Main Road Access",
                options: YES_NO,
            },
        ],
    ),
    (
        "Additional Amenities",
        &[
            Widget::Radio {
                name: "guestroom",
                label: "Guest Room",
                options: YES_NO,
            },
            Widget::Radio {
                name: "basement",
                label: "Basement",
                options: YES_NO,
            },
            Widget::Radio {
                name: "hotwaterheating",
                label: "Hot Water Heating",
                options: YES_NO,
            },
            Widget::Radio {
                name: "airconditioning",
                label: "Air Conditioning",
                options: YES_NO,
            },
            Widget::Radio {
                name: "prefarea",
                label: "Preferred Area",
                options: YES_NO,
            },
            Widget::Select {
                name: "furnishingstatus",
                label: "Furnishing Status",
                options: FURNISHING,
            },
        ],
    ),
];

/// Field values shown in the widgets, falling back to widget defaults
#[derive(Debug, Clone, Default)]
pub struct FormValues(RawFields);

impl FormValues {
    pub fn new(submitted: RawFields) -> Self {
        Self(submitted)
    }

    fn value<'a>(&'a self, widget: &'a Widget) -> &'a str {
        self.0
            .get(widget.name())
            .map(String::as_str)
            .unwrap_or_else(|| widget.default_value())
    }

    /// Raw fields populated with every widget default
    pub fn defaults() -> RawFields {
        SECTIONS
            .iter()
            .flat_map(|(_, widgets)| widgets.iter())
            .map(|w| (w.name().to_string(), w.default_value().to_string()))
            .collect()
    }
}

/// Result shown under the form
pub enum Outcome {
    Pending,
    Succeeded(Estimate),
    Failed(String),
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 1100px; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
.columns { display: grid; grid-template-columns: repeat(3, 1fr); gap: 2rem; }
.field { margin-bottom: 1rem; }
.field label, .field legend { display: block; font-weight: 600; margin-bottom: .25rem; }
fieldset { border: none; padding: 0; }
button { font-size: 1rem; padding: .6rem 1.4rem; border-radius: .4rem; border: none; background: #4f46e5; color: white; cursor: pointer; }
.result { margin-top: 1.5rem; padding: 1rem; border-radius: .4rem; }
.result.success { background: #dcfce7; color: #166534; font-size: 1.5rem; font-weight: 700; }
.result.error { background: #fee2e2; color: #991b1b; }
.result.empty { display: none; }
nav a { margin-right: 1rem; }
"#;

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                nav {
                    a href="/" { "Form" }
                    a href="/dashboard" { "Dashboard" }
                }
                h1 { "🏡 Indian House Price Predictor" }
                p { "Enter the property details below to get an estimated price." }
                (content)
            }
        }
    }
}

fn widget(widget: &Widget, value: &str) -> Markup {
    match widget {
        Widget::Number {
            name,
            label,
            min,
            max,
            step,
            ..
        } => html! {
            div class="field" {
                label for=(name) { (label) }
                input type="number" id=(name) name=(name) value=(value)
                    min=(min) max=[max] step=(step) required;
            }
        },
        Widget::Radio {
            name,
            label,
            options,
        } => html! {
            fieldset class="field" {
                legend { (label) }
                @for choice in options.iter() {
                    label {
                        input type="radio" name=(name) value=(choice) checked[*choice == value];
                        " " (choice)
                    }
                }
            }
        },
        Widget::Select {
            name,
            label,
            options,
        } => html! {
            div class="field" {
                label for=(name) { (label) }
                select id=(name) name=(name) {
                    @for choice in options.iter() {
                        option value=(choice) selected[*choice == value] { (choice) }
                    }
                }
            }
        },
    }
}

fn widgets(values: &FormValues) -> Markup {
    html! {
        div class="columns" {
            @for (heading, section) in SECTIONS {
                div {
                    h3 { (heading) }
                    @for w in section.iter() {
                        (widget(w, values.value(w)))
                    }
                }
            }
        }
    }
}

fn outcome_panel(outcome: &Outcome) -> Markup {
    match outcome {
        Outcome::Pending => html! { div id="result" class="result empty" {} },
        Outcome::Succeeded(estimate) => html! {
            div id="result" class="result success" {
                "💰 Estimated Price: " (estimate.formatted)
            }
        },
        Outcome::Failed(message) => html! {
            div id="result" class="result error" { (message) }
        },
    }
}

/// Form-submission page
pub fn form_page(values: &FormValues, outcome: &Outcome) -> Markup {
    layout(
        "House Price Predictor",
        html! {
            form method="post" action="/predict" {
                (widgets(values))
                hr;
                button type="submit" title="Click to predict the house price" { "Predict Price" }
            }
            (outcome_panel(outcome))
        },
    )
}

const DASHBOARD_SCRIPT: &str = r#"
document.getElementById('predict').addEventListener('click', async () => {
  const fields = {};
  document.querySelectorAll('#dashboard input[type=number], #dashboard select').forEach(el => {
    fields[el.name] = el.value;
  });
  document.querySelectorAll('#dashboard input[type=radio]:checked').forEach(el => {
    fields[el.name] = el.value;
  });
  const panel = document.getElementById('result');
  try {
    const response = await fetch('/api/estimate', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(fields),
    });
    const body = await response.json();
    if (response.ok) {
      panel.className = 'result success';
      panel.textContent = '💰 Estimated Price: ' + body.formatted;
    } else {
      panel.className = 'result error';
      panel.textContent = body.error;
    }
  } catch (err) {
    panel.className = 'result error';
    panel.textContent = 'The estimator could not be reached: ' + err;
  }
});
"#;

/// Single-page dashboard driven by `/api/estimate`
pub fn dashboard_page(model_version: &str) -> Markup {
    layout(
        "House Price Dashboard",
        html! {
            div id="dashboard" {
                (widgets(&FormValues::default()))
                hr;
                button id="predict" type="button" title="Click to predict the house price" { "Predict Price" }
            }
            (outcome_panel(&Outcome::Pending))
            p { small { "Model version " (model_version) } }
            script { (PreEscaped(DASHBOARD_SCRIPT)) }
        },
    )
}
