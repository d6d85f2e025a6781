//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. They are used by
//! Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, regenerate this file with
//! `diesel print-schema` or update it by hand.

diesel::table! {
    /// HR core employees. Read-only from payroll.
    employees (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        /// `active`, `inactive` or `terminated`.
        status -> Text,
        base_salary -> Nullable<Numeric>,
        currency -> Nullable<Text>,
        bank_account -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// HR core leave types.
    leave_types (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        name -> Text,
        paid -> Bool,
    }
}

diesel::table! {
    /// HR core leave requests.
    leave_requests (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        employee_id -> Uuid,
        leave_type_id -> Uuid,
        start_date -> Date,
        end_date -> Date,
        start_half -> Bool,
        end_half -> Bool,
        /// `pending`, `approved`, `rejected` or `cancelled`.
        status -> Text,
    }
}

diesel::table! {
    /// Pay periods and their lifecycle status.
    pay_periods (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        schedule_id -> Uuid,
        start_date -> Date,
        end_date -> Date,
        /// `draft`, `reviewed` or `finalized`.
        status -> Text,
        /// Set exactly when `status = 'finalized'`.
        finalized_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tenant pay element catalog.
    pay_elements (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        name -> Text,
        element_type -> Text,
        calc_type -> Text,
        default_amount -> Numeric,
        taxable -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only pay-line inputs.
    payroll_inputs (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        period_id -> Uuid,
        employee_id -> Uuid,
        element_id -> Uuid,
        units -> Numeric,
        rate -> Numeric,
        amount -> Numeric,
        source -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Signed ad-hoc adjustments.
    payroll_adjustments (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        period_id -> Uuid,
        employee_id -> Uuid,
        description -> Text,
        amount -> Numeric,
        effective_date -> Nullable<Date>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One calculated result per period and employee.
    payroll_results (period_id, employee_id) {
        tenant_id -> Uuid,
        period_id -> Uuid,
        employee_id -> Uuid,
        gross -> Numeric,
        deductions -> Numeric,
        net -> Numeric,
        currency -> Text,
        warnings -> Array<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Soft per-employee failures of the latest run.
    payroll_run_failures (period_id, employee_id) {
        tenant_id -> Uuid,
        period_id -> Uuid,
        employee_id -> Uuid,
        code -> Text,
        message -> Text,
    }
}

diesel::table! {
    /// Payslips created at finalize.
    payslips (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        period_id -> Uuid,
        employee_id -> Uuid,
        file_ref -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Idempotency claims and cached responses.
    idempotency_keys (tenant_id, user_id, key, endpoint) {
        tenant_id -> Uuid,
        user_id -> Uuid,
        key -> Text,
        endpoint -> Text,
        request_hash -> Bytea,
        /// `NULL` while the claimed operation is running.
        cached_response -> Nullable<Jsonb>,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(leave_requests -> employees (employee_id));
diesel::joinable!(leave_requests -> leave_types (leave_type_id));
diesel::joinable!(payroll_inputs -> pay_elements (element_id));
diesel::joinable!(payroll_inputs -> pay_periods (period_id));
diesel::joinable!(payroll_adjustments -> pay_periods (period_id));
diesel::joinable!(payroll_results -> employees (employee_id));
diesel::joinable!(payroll_results -> pay_periods (period_id));
diesel::joinable!(payslips -> employees (employee_id));
diesel::joinable!(payslips -> pay_periods (period_id));

diesel::allow_tables_to_appear_in_same_query!(
    employees,
    leave_types,
    leave_requests,
    pay_periods,
    pay_elements,
    payroll_inputs,
    payroll_adjustments,
    payroll_results,
    payroll_run_failures,
    payslips,
    idempotency_keys,
);
