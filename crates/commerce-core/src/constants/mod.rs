// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Stored-procedure names, defaults, limits, and user-facing messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Constants module
//!
//! Constants are grouped by domain rather than living in a single flat list.

/// Stored-procedure names exposed by the remote data service
pub mod rpc {
    /// Finance dashboard KPIs, daily series and top products
    pub const DASHBOARD_STATS: &str = "get_dashboard_stats";
    /// Daily sales series against the previous period
    pub const DAILY_SALES_PREV: &str = "get_serie_ventas_diaria_comparacion";
    /// Daily sales series against the same period last year
    pub const DAILY_SALES_YOY: &str = "get_serie_ventas_diaria_yoy";
    /// Revenue per product
    pub const PRODUCT_REVENUE: &str = "get_facturacion_por_producto";
    /// Units sold per product
    pub const TOP_PRODUCTS_UNITS: &str = "get_top_productos_unidades";
    /// Product page KPIs
    pub const PRODUCT_KPIS: &str = "get_productos_kpis";
    /// Pareto class A products
    pub const PARETO_80: &str = "get_pareto_80_productos";
    /// Pareto class A changes against the previous period
    pub const PARETO_PREV: &str = "get_pareto_a_comparacion";
    /// Pareto class A changes against the same period last year
    pub const PARETO_YOY: &str = "get_pareto_yoy_comparacion";
    /// Top payment methods
    pub const TOP_PAYMENT_METHODS: &str = "get_top_metodos_pago";
    /// Meta Ads home summary
    pub const META_SUMMARY: &str = "meta_home_summary_mixed";
    /// Meta Ads campaign ranking with recommendations
    pub const META_CAMPAIGN_RANKING: &str = "meta_campaign_ranking_reco";
    /// Meta Ads ad-set ranking with recommendations
    pub const META_ADSET_RANKING: &str = "meta_adset_ranking_reco";
    /// Meta Ads daily spend/conversions series
    pub const META_TIMESERIES: &str = "meta_home_timeseries_mixed";
    /// Upsert of a CRM contact's call/sale status
    pub const CRM_SET_CONTACT_STATUS: &str = "crm_set_contact_status";
}

/// Tables read directly through the data service
pub mod tables {
    /// CRM contacts
    pub const CRM_CONTACTS: &str = "crm_contacts";
    /// Columns selected from `crm_contacts`
    pub const CRM_CONTACT_COLUMNS: &str = "phone_number,contact_name,llamada_por_tel,venta,conversation_id,conversation_display_id,created_at,updated_at";
}

/// Default values applied when callers omit parameters
pub mod defaults {
    /// Company identifier passed as `p_empresa`
    pub const COMPANY_ID: &str = "3526";
    /// Page size for product listings
    pub const PRODUCT_PAGE_SIZE: u32 = 20;
    /// Upper bound for product page size
    pub const PRODUCT_PAGE_SIZE_MAX: u32 = 50;
    /// Pareto cumulative-share threshold
    pub const PARETO_THRESHOLD: f64 = 0.8;
    /// Pareto row limit
    pub const PARETO_LIMIT: u32 = 200;
    /// Pareto comparison change-list limit
    pub const PARETO_CHANGES_LIMIT: u32 = 200;
    /// Payment methods returned by the top-methods query
    pub const TOP_PAYMENT_METHODS_LIMIT: u32 = 5;
    /// Meta Ads conversion level
    pub const META_CONVERSION_LEVEL: &str = "campaign";
    /// Days covered by the finance summary default range
    pub const FINANCE_SUMMARY_DAYS: i64 = 30;
    /// Days before today where trailing default ranges start
    pub const TRAILING_RANGE_DAYS: i64 = 29;
    /// Client listing limit
    pub const CLIENT_LIST_LIMIT: u32 = 500;
    /// Label used when a lead has no conversation labels
    pub const NO_LABEL: &str = "sin_etiqueta";
    /// Separator used when joining lead labels
    pub const LABEL_SEPARATOR: &str = " · ";
}

/// Chat assistant settings
pub mod chat {
    /// Default chat model
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    /// Messages loaded as context for a turn
    pub const HISTORY_LIMIT: u32 = 30;
    /// Model request timeout in seconds
    pub const LLM_TIMEOUT_SECS: u64 = 28;
    /// Retries after the first failed model request
    pub const LLM_MAX_RETRIES: u32 = 1;
    /// Title given to new conversations
    pub const DEFAULT_CONVERSATION_TITLE: &str = "Nueva conversación";
    /// Name of the statistics tool offered to the model
    pub const STATS_TOOL_NAME: &str = "getStats";
    /// Products kept in the statistics summary
    pub const TOP_PRODUCTS: usize = 10;
    /// Days kept in each best-days ranking
    pub const BEST_DAYS: usize = 5;
    /// Tool invocation state persisted with assistant messages
    pub const TOOL_STATE_OUTPUT_AVAILABLE: &str = "output-available";
}

/// User-facing messages returned by the API
pub mod messages {
    /// Chat turn without a conversation id
    pub const MISSING_CONVERSATION_ID: &str = "No hay ID de Conversacion";
    /// Chat turn without a message
    pub const MISSING_USER_MESSAGE: &str = "No hay mensaje de usuario";
    /// Generic chat turn failure
    pub const CHAT_SERVER_ERROR: &str = "Error en el servidor";
    /// Conversation rename without a title
    pub const MISSING_TITLE: &str = "Falta titulo";
    /// Leads webhook failure
    pub const WEBHOOK_UNREACHABLE: &str = "Error al conectar con n8n";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Service identity used in logs
pub mod service_names {
    /// Server binary name
    pub const COMMERCE_INSIGHTS_SERVER: &str = "commerce-insights-server";
}
