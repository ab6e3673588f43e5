//! Column names used by the legacy exports.
//!
//! Slices list aliases in lookup order; the first non-blank one wins.

/// Patients export
pub mod patient {
    pub const OLD_ID: &[&str] = &["id", "id_paciente"];
    pub const NAME: &str = "nombre";
    pub const SURNAME: &[&str] = &["apellidos", "apellido"];
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "telefono";
    pub const BIRTH_DATE: &str = "fecha_nacimiento";
    pub const SEX: &str = "id_sexo";
    pub const ADDRESS: &str = "direccion";
    pub const CITY: &str = "ciudad";
    pub const CLINIC: &str = "id_clinica";
    pub const POSTAL_CODE: &str = "codigo_postal";
    pub const TAX_ID: &str = "nif_cif";
    pub const REFERRED_BY: &str = "referido";
    pub const PARENT_CLINIC: &str = "id_super_clinica";
    pub const REGISTRATION_STATE: &str = "id_estado_registro";
    pub const CONSENT: &str = "lopd_aceptado";
    pub const INTAKE_DATE: &str = "fecha_alta";
    pub const CREATED_BY: &str = "usuario_creacion";
}

/// Budgets export
pub mod budget {
    pub const OLD_ID: &[&str] = &["id_presupuesto", "id"];
    pub const PATIENT: &str = "id_paciente";
    pub const PARENT_CLINIC: &str = "id_super_clinica";
    pub const CLINIC: &str = "id_clinica";
    pub const DATE: &str = "fecha";
    pub const DOCUMENT_URL: &str = "url_presupuesto";
    pub const TOTAL: &str = "monto_total";
    pub const PAID: &str = "monto_pagado";
    pub const OUTSTANDING: &str = "saldo_pendiente";
    pub const STATUS: &str = "id_estado";
    pub const PAYMENT_TYPE: &str = "id_tipo_pago";
    pub const REGISTRATION_STATE: &str = "id_estado_registro";
}

/// Budget detail lines export, including the inline treatment/product columns
pub mod detail {
    pub const OLD_ID: &[&str] = &["id_detalle_presupuesto", "id"];
    pub const BUDGET: &str = "id_presupuesto";
    pub const TREATMENT: &str = "id_tratamiento";
    pub const PRODUCT: &str = "id_producto";
    pub const LINE_NUMBER: &str = "item";
    pub const DESCRIPTION: &str = "descripcion";
    pub const QUANTITY: &str = "cantidad";
    pub const PRICE: &str = "precio";
    pub const DISCOUNT: &str = "descuento";
    pub const TAX_TYPE: &str = "id_tipo_iva";
    pub const LINE_TOTAL: &str = "total_item";
    pub const CLINIC: &str = "id_clinica";
    pub const PARENT_CLINIC: &str = "id_super_clinica";

    pub const TREATMENT_NAME: &str = "nombre_tratamiento";
    pub const TREATMENT_DESCRIPTION: &str = "descripcion_tratamiento";
    pub const DURATION: &str = "duracion";

    pub const PRODUCT_NAME: &str = "nombre_producto";
    pub const PRODUCT_DESCRIPTION: &str = "descripcion_producto";
    pub const STOCK: &str = "stock";
}
