use yew::prelude::*;
use web_sys::HtmlInputElement;

/// The `<iframe>` a vPOS form is rendered in. Fills its container.
#[derive(Properties, PartialEq)]
pub struct VposFrameProps {
    /// Attached to the iframe element
    pub frame: NodeRef,
    /// Accessible title of the frame
    #[prop_or(AttrValue::Static("vPOS"))]
    pub title: AttrValue,
}

#[function_component(VposFrame)]
pub fn vpos_frame(props: &VposFrameProps) -> Html {
    html! {
        <iframe
            ref={props.frame.clone()}
            title={props.title.clone()}
            class="vpos-frame"
            style="width: 100%; height: 100%; border: 0;"
        />
    }
}

/// A process id field with a button that asks to load the form.
#[derive(Properties, PartialEq)]
pub struct ProcessIdFormProps {
    /// Emits the entered process id
    pub on_load: Callback<String>,
    /// Button label
    #[prop_or(AttrValue::Static("Load form"))]
    pub label: AttrValue,
    #[prop_or_default]
    pub disabled: bool,
}

#[function_component(ProcessIdForm)]
pub fn process_id_form(props: &ProcessIdFormProps) -> Html {
    let process_id = use_state(String::new);

    let oninput = {
        let process_id = process_id.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            process_id.set(input.value());
        })
    };

    let onclick = {
        let process_id = process_id.clone();
        let on_load = props.on_load.clone();
        Callback::from(move |_: MouseEvent| on_load.emit(process_id.trim().to_owned()))
    };

    html! {
        <div class="vpos-process-form">
            <input
                type="text"
                class="vpos-text-input"
                placeholder="process_id"
                value={(*process_id).clone()}
                {oninput}
            />
            <button
                {onclick}
                disabled={props.disabled || process_id.trim().is_empty()}
                class="vpos-button"
            >
                { props.label.to_string() }
            </button>
        </div>
    }
}
