use leptos::{ev::SubmitEvent, prelude::*};

use crate::contact::{ContactError, ContactForm, ContactSubmission, Field, FormErrors, SubmissionPhase};

use super::browser::BrowserScheduler;

#[component]
pub fn ContactSection() -> impl IntoView {
    let form = RwSignal::new(ContactForm::default());
    let errors = RwSignal::new(FormErrors::default());
    let (phase, set_phase) = signal(SubmissionPhase::Idle);
    let submission = StoredValue::new_local(
        ContactSubmission::new(BrowserScheduler).on_change(move |next| {
            if next == SubmissionPhase::Submitted {
                form.set(ContactForm::default());
            }
            set_phase(next);
        }),
    );

    on_cleanup(move || {
        submission.try_with_value(ContactSubmission::cancel);
    });

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let result = form.with_untracked(|f| submission.with_value(|s| s.submit(f)));
        match result {
            Ok(()) => errors.set(FormErrors::default()),
            Err(ContactError::Invalid(found)) => errors.set(found),
            Err(ContactError::Busy) => {}
            Err(err) => log::error!("contact form: {err}"),
        }
    };

    let button_label = move || match phase.get() {
        SubmissionPhase::Idle => "Send Message",
        SubmissionPhase::Submitting => "Sending...",
        SubmissionPhase::Submitted => "Message Sent!",
    };

    view! {
        <section class="w-full max-w-xl my-12">
            <h2 class="text-2xl font-bold mb-6 text-purple-300">"Get In Touch"</h2>
            <form class="flex flex-col gap-4" on:submit=on_submit novalidate>
                <FormField field=Field::Name label="Name" form errors />
                <FormField field=Field::Email label="Email" form errors />
                <FormField field=Field::Message label="Message" form errors multiline=true />
                <button
                    type="submit"
                    class="px-4 py-2 rounded-md bg-purple-600 hover:bg-purple-500 disabled:opacity-50"
                    disabled=move || phase.get() != SubmissionPhase::Idle
                >
                    {button_label}
                </button>
                <Show when=move || phase.get() == SubmissionPhase::Submitted>
                    <p class="text-green-400">"Thanks! I'll get back to you soon."</p>
                </Show>
            </form>
        </section>
    }
}

#[component]
fn FormField(
    field: Field,
    label: &'static str,
    form: RwSignal<ContactForm>,
    errors: RwSignal<FormErrors>,
    #[prop(optional)] multiline: bool,
) -> impl IntoView {
    let value = move || form.with(|f| f.get(field).to_string());
    let on_input = move |ev: leptos::ev::Event| {
        let text = event_target_value(&ev);
        form.update(|f| f.set(field, text));
        if errors.with_untracked(|e| e.get(field).is_some()) {
            errors.update(|e| e.clear(field));
        }
    };
    let error = move || errors.with(|e| e.get(field)).map(|e| e.to_string());
    let input_class = move || {
        if error().is_some() {
            "w-full px-4 py-2 rounded-md border border-red-500 bg-gray-800"
        } else {
            "w-full px-4 py-2 rounded-md border border-gray-700 bg-gray-800 focus:outline-none focus:ring-2 focus:ring-purple-500"
        }
    };

    let input = if multiline {
        view! { <textarea rows="5" class=input_class prop:value=value on:input=on_input /> }
            .into_any()
    } else {
        view! { <input type="text" class=input_class prop:value=value on:input=on_input /> }
            .into_any()
    };

    view! {
        <label class="flex flex-col gap-1">
            <span class="text-sm text-gray-300">{label}</span>
            {input}
            {move || error().map(|msg| view! { <span class="text-sm text-red-400">{msg}</span> })}
        </label>
    }
}
