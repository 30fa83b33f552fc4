//! SQL for the Postgres metric source.
//!
//! Aggregate columns are aliased with the stable semantic metric keys, so
//! resolution never depends on the lookback window. Tenant schemas are
//! spliced in as quoted, validated identifiers (`{schema}`); everything else
//! is a bound parameter:
//!
//! | Param | Type   | Meaning                                   |
//! |-------|--------|-------------------------------------------|
//! | `$1`  | int8   | tenant id                                 |
//! | `$2`  | int4   | lookback window in months                 |
//! | `$3`  | text   | excluded e-mail suffix (NULL = none)      |

use tenantpulse_core::SchemaName;

/// Live tenants with their plan code, schema and CRM id.
pub const LIVE_TENANTS: &str = r#"
SELECT
    t.company::text AS customer,
    t.id::int8 AS tenant_id,
    tp.plan::int8 AS plan_code,
    iss.schema_name::text AS schema_name,
    tp.hubspot_id::text AS external_crm_id
FROM public.tenants t
LEFT JOIN public.tenant_profiles tp ON t.id = tp.tenant_id
LEFT JOIN information_schema.schemata iss
    ON t.id::text = reverse(split_part(reverse(iss.schema_name), '_', 1))
WHERE tp.status = 1
  AND iss.schema_name IS NOT NULL
ORDER BY t.id
"#;

const TENANT_FACTS: &str = r#"
WITH window_start AS (
    SELECT CURRENT_DATE - make_interval(months => $2::int4) AS since
),
settings_row AS (
    SELECT * FROM {schema}.settings LIMIT 1
),
esign_settings AS (
    SELECT
        COALESCE((SELECT esign FROM settings_row), false) AS native_esign_enabled,
        COALESCE(
            (SELECT p.jsonb_value <> '{}'::jsonb
             FROM {schema}.properties p
             WHERE p.scope_name = 'docu_sign' AND p.name = 'user_info'
             LIMIT 1),
            false
        ) AS docusign_enabled
),
logged_in_users AS (
    SELECT COUNT(DISTINCT u.id)::int8 AS logged_in_count
    FROM public.users u
    JOIN public.employments e ON e.user_id = u.id
    WHERE e.tenant_id = $1
      AND u.current_sign_in_at >= (SELECT since FROM window_start)
      AND ($3::text IS NULL OR u.email NOT LIKE '%' || $3::text)
),
active_users AS (
    SELECT COUNT(DISTINCT v.whodunnit::int8)::int8 AS active_count
    FROM {schema}.versions v
    JOIN public.users u ON u.id = v.whodunnit::int8
    WHERE v.created_at >= (SELECT since FROM window_start)
      AND ($3::text IS NULL OR u.email NOT LIKE '%' || $3::text)
),
rbac AS (
    SELECT
        COALESCE((SELECT access_groups FROM settings_row), false) AS rbac_status,
        (SELECT COUNT(*) FROM {schema}.access_groups
         WHERE predefined = false AND kind = 10)::int8 AS rbac_groups
),
saved_views AS (
    SELECT COUNT(DISTINCT ui.id)::int8 AS saved_custom_views
    FROM {schema}.ui_tables_filters ui
    WHERE ui.title <> 'Default' AND ui.meta_status = '20'
),
smart_forms_flag AS (
    SELECT COALESCE(
        (SELECT tf.meta_status = 10
         FROM public.tenants_features tf
         JOIN public.tenant_profiles tp ON tf.tenant_profile_id = tp.id
         WHERE tf.kind = '280' AND tp.tenant_id = $1
         LIMIT 1),
        false
    ) AS smart_forms_enabled
),
scored_entities AS (
    SELECT
        ct.id AS tab_id,
        cts.scorable_type,
        MAX(cts.updated_at::date) AS latest_update
    FROM {schema}.custom_tabs ct
    LEFT JOIN {schema}.custom_tab_scores cts
        ON ct.id = cts.custom_tab_id
        AND cts.meta_status = 20
        AND (cts.value != 0 OR cts.value IS NULL)
    WHERE ct.scored = true
    GROUP BY ct.id, cts.scorable_type
),
unscored_forms AS (
    SELECT COUNT(*)::int8 AS smart_forms_unscored
    FROM {schema}.custom_tabs ct
    WHERE ct.scored = true
      AND NOT EXISTS (
          SELECT 1 FROM {schema}.custom_tab_scores cts
          WHERE cts.custom_tab_id = ct.id AND cts.value != 0 AND cts.meta_status = 20
      )
),
smart_forms AS (
    SELECT
        COUNT(DISTINCT se.tab_id)::int8 AS smart_forms_count,
        STRING_AGG(DISTINCT se.scorable_type, ' | ' ORDER BY se.scorable_type) AS smart_form_types,
        MAX(se.latest_update) AS smart_forms_latest_score
    FROM scored_entities se
),
auto_build AS (
    SELECT
        COALESCE((SELECT supplier_auto_build FROM settings_row), false) AS auto_build_enabled,
        (SELECT COUNT(DISTINCT s.id)
         FROM {schema}.suppliers s
         WHERE EXISTS (
             SELECT 1
             FROM {schema}.custom_fields cf
             JOIN {schema}.custom_groups cg ON cf.custom_group_id = cg.id
             WHERE cg.predefined_kind = 100
               AND s.custom_fields_data ? cf.id::text
               AND COALESCE(s.custom_fields_data->>cf.id::text, '') <> ''
         ))::int8 AS auto_build_suppliers
),
signing AS (
    SELECT
        COUNT(DISTINCT esp.id) FILTER (WHERE esp.provider = 10)::int8 AS native_esigns,
        COUNT(DISTINCT esp.id) FILTER (WHERE esp.provider = 20)::int8 AS docusigns
    FROM {schema}.esign_sign_processes esp
    WHERE esp.meta_status = 100
      AND esp.file_host_type = 'Contract'
      AND esp.updated_at >= (SELECT since FROM window_start)
),
contracts AS (
    SELECT
        COUNT(DISTINCT c.id)::int8 AS total_contracts,
        COUNT(DISTINCT c.id) FILTER (WHERE c.meta_status = 20)::int8 AS live_contracts,
        COUNT(DISTINCT c.id) FILTER (WHERE c.created_at >= (SELECT since FROM window_start))::int8
            AS new_live_contracts,
        COUNT(DISTINCT c.id) FILTER (WHERE c.updated_at >= (SELECT since FROM window_start))::int8
            AS updated_live_contracts,
        COALESCE(ROUND(AVG(cs.annual_value_cents) FILTER (WHERE c.meta_status = 20) / 100), 0)::numeric
            AS average_contract_value,
        COUNT(DISTINCT c.id) FILTER (WHERE o.id IS NOT NULL AND c.meta_status = 20)::int8
            AS owned_live_contracts,
        COUNT(DISTINCT c.id) FILTER (WHERE o.id IS NULL AND c.meta_status = 20)::int8
            AS unowned_live_contracts
    FROM {schema}.contracts c
    LEFT JOIN {schema}.contract_summaries cs ON c.id = cs.contract_id
    LEFT JOIN {schema}.owners o
        ON c.id = o.host_id
        AND o.host_type = 'Contract'
        AND EXISTS (
            SELECT 1 FROM {schema}.owner_kinds ok
            WHERE ok.id = o.owner_kind_id AND ok.predefined = true
        )
),
contract_links AS (
    SELECT COUNT(DISTINCT c.id)::int8 AS linked_contracts
    FROM {schema}.contracts c
    JOIN {schema}.contract_links cl
        ON c.id = cl.linked_contract_id OR c.id = cl.related_contract_id
    WHERE c.meta_status = 20
),
supplier_links AS (
    SELECT COUNT(DISTINCT s.id)::int8 AS linked_suppliers
    FROM {schema}.suppliers s
    JOIN {schema}.supplier_links sl
        ON s.id = sl.linked_supplier_id OR s.id = sl.related_supplier_id
    WHERE s.meta_status = 20
),
master_records AS (
    SELECT
        COUNT(*) FILTER (WHERE has_master_record)::int8 AS master_record_count,
        COUNT(*)::int8 AS contract_reviews
    FROM {schema}.contract_reviews
),
ai_extract AS (
    SELECT COUNT(DISTINCT id)::int8 AS ai_extract_ready
    FROM {schema}.attachments_file_analyses_summaries
    WHERE analyzed_at::date >= (SELECT since FROM window_start)
      AND analyzer_job_status = 30
),
events AS (
    SELECT
        COUNT(DISTINCT a.id)::int8 AS events_total,
        COUNT(DISTINCT a.id) FILTER (WHERE a.created_at >= (SELECT since FROM window_start))::int8
            AS events_new,
        COUNT(DISTINCT a.id) FILTER (WHERE a.date_completed >= (SELECT since FROM window_start))::int8
            AS events_completed,
        COUNT(DISTINCT a.id) FILTER (WHERE a.due_date < CURRENT_DATE AND a.date_completed IS NULL)::int8
            AS events_overdue,
        AVG(EXTRACT(EPOCH FROM (a.date_completed - a.created_at)) / 86400.0)
            FILTER (WHERE a.date_completed >= (SELECT since FROM window_start))::numeric
            AS events_avg_completion_days,
        STRING_AGG(DISTINCT co.label, ' | ' ORDER BY co.label) AS event_types
    FROM {schema}.activities a
    LEFT JOIN {schema}.custom_options co ON a.activity_type = co.id
)
SELECT
    logged_in_users.logged_in_count,
    active_users.active_count,
    rbac.rbac_status,
    rbac.rbac_groups,
    contracts.total_contracts,
    contracts.live_contracts,
    contracts.new_live_contracts,
    contracts.updated_live_contracts,
    (SELECT reporting_currency::text FROM settings_row) AS main_currency,
    contracts.average_contract_value,
    contracts.owned_live_contracts,
    contracts.unowned_live_contracts,
    contract_links.linked_contracts,
    supplier_links.linked_suppliers,
    master_records.master_record_count,
    master_records.contract_reviews,
    ai_extract.ai_extract_ready,
    COALESCE((SELECT open_ai_contract_summary FROM settings_row), false) AS ai_contract_summary,
    events.events_total,
    events.events_new,
    events.events_completed,
    events.events_overdue,
    events.events_avg_completion_days,
    events.event_types,
    smart_forms_flag.smart_forms_enabled,
    smart_forms.smart_forms_count,
    smart_forms.smart_form_types,
    smart_forms.smart_forms_latest_score,
    unscored_forms.smart_forms_unscored,
    saved_views.saved_custom_views,
    auto_build.auto_build_enabled,
    auto_build.auto_build_suppliers,
    esign_settings.native_esign_enabled,
    esign_settings.docusign_enabled,
    signing.native_esigns,
    signing.docusigns
FROM logged_in_users
CROSS JOIN active_users
CROSS JOIN rbac
CROSS JOIN contracts
CROSS JOIN contract_links
CROSS JOIN supplier_links
CROSS JOIN master_records
CROSS JOIN ai_extract
CROSS JOIN events
CROSS JOIN smart_forms_flag
CROSS JOIN smart_forms
CROSS JOIN unscored_forms
CROSS JOIN saved_views
CROSS JOIN auto_build
CROSS JOIN esign_settings
CROSS JOIN signing
"#;

/// Per-tenant facts query with the tenant's schema spliced in.
pub fn tenant_facts(schema: &SchemaName) -> String {
    TENANT_FACTS.replace("{schema}", &schema.quoted())
}
