use crate::{Details, ErrorKind, FormatError, SourceError, ValidationMessages, NON_FIELD_ERRORS};

/// Details of a validation error, grouped by input field whenever the error knows them.
///
/// Messages not tied to a field end up under [`NON_FIELD_ERRORS`]. No message is ever dropped. A
/// validation error raised without messages is described by its own message, if it has one.
pub fn validation_error_details(error: &SourceError) -> Result<Details, FormatError> {
    let Some(messages) = error.validation_messages() else {
        if !error.kind().is_a(ErrorKind::Validation) {
            return Err(FormatError::MissingValidationPayload { kind: error.kind() });
        }

        let messages: Vec<String> = error.message().map(str::to_string).into_iter().collect();
        return Ok(Details::from([(NON_FIELD_ERRORS.to_string(), messages)]));
    };

    let details = match messages {
        ValidationMessages::Fields(fields) => fields.clone(),
        ValidationMessages::Single(message) => Details::from([(NON_FIELD_ERRORS.to_string(), vec![message.clone()])]),
        ValidationMessages::List(messages) => Details::from([(NON_FIELD_ERRORS.to_string(), messages.clone())]),
    };

    Ok(details)
}
