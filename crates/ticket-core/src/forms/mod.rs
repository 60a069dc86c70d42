//! Formularios dinámicos: construcción de controles a partir de
//! `FieldDefinition` y validación de envíos.
//!
//! Flujo típico:
//! 1. `FormBuilder` filtra campos por rol, resuelve valores iniciales y
//!    produce un `DynamicForm` (mapa ordenado `key -> Control`).
//! 2. La capa de presentación renderiza los controles.
//! 3. `DynamicForm::clean` valida un `Submission` y devuelve `CleanedData`
//!    listo para el merge en el `Entry`.

mod builder;
mod control;
mod upload;
mod validation;

pub use builder::{control_for, DynamicForm, FormBuilder, FormFieldMapping, InitialValues};
pub use control::{Control, ControlKind};
pub use upload::{FileRules, Upload};
pub use validation::{CleanedData, CleanedValue, Submission, ValidationErrors};

/// Mensaje de error del validador de regex configurado en un campo.
pub const INVALID_FORMAT: &str = "Invalid format";
/// Mensaje para campos obligatorios vacíos.
pub const REQUIRED: &str = "This field is required.";
