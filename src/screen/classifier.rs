use crate::screen::screen_model::ElementKind;

/// Map a widget class name onto the closed set of element kinds.
///
/// Matching is on the simple class name (the segment after the last `.`), so
/// support-library and material variants land in the same bucket as the
/// framework widget.
pub fn classify_class_name(class_name: &str) -> ElementKind {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);

    match simple {
        "Button" | "ImageButton" | "MaterialButton" | "AppCompatButton"
        | "AppCompatImageButton" | "FloatingActionButton" => ElementKind::Button,

        "EditText" | "AutoCompleteTextView" | "MultiAutoCompleteTextView"
        | "AppCompatEditText" | "TextInputEditText" | "SearchView$SearchAutoComplete" => {
            ElementKind::TextField
        }

        "CheckBox" | "AppCompatCheckBox" | "MaterialCheckBox" | "CheckedTextView" => {
            ElementKind::Checkbox
        }

        "RadioButton" | "AppCompatRadioButton" | "MaterialRadioButton" => ElementKind::Radio,

        "Switch" | "SwitchCompat" | "SwitchMaterial" | "MaterialSwitch" | "ToggleButton" => {
            ElementKind::Switch
        }

        "Spinner" | "AppCompatSpinner" => ElementKind::Spinner,

        "ListView" | "GridView" | "ScrollView" | "NestedScrollView" | "RecyclerView" => {
            ElementKind::ScrollContainer
        }

        _ => ElementKind::Generic,
    }
}
