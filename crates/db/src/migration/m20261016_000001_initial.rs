//! Initial database migration.
//!
//! Creates the tenant, catalog, asset and quote tables. Cross-table
//! references carry `organization_id` in composite foreign keys so a row can
//! never point at another tenant's data.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANTS
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;

        // ============================================================
        // PART 2: CATALOG
        // ============================================================
        db.execute_unprepared(VAT_RATES_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(MATERIALS_SQL).await?;
        db.execute_unprepared(PRODUCT_MATERIALS_SQL).await?;

        // ============================================================
        // PART 3: ASSETS
        // ============================================================
        db.execute_unprepared(PRODUCT_ASSETS_SQL).await?;

        // ============================================================
        // PART 4: QUOTES
        // ============================================================
        db.execute_unprepared(QUOTES_SQL).await?;
        db.execute_unprepared(QUOTE_LINES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(200) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const VAT_RATES_SQL: &str = r"
CREATE TABLE vat_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(200) NOT NULL,
    rate_bps INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_vat_rates_org_name UNIQUE (organization_id, name),
    CONSTRAINT uq_vat_rates_org_id UNIQUE (organization_id, id),
    CONSTRAINT chk_vat_rates_bps CHECK (rate_bps BETWEEN 0 AND 10000)
);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    vat_rate_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    description TEXT,
    sku VARCHAR(64),
    unit VARCHAR(32) NOT NULL DEFAULT 'pcs',
    unit_price_cents BIGINT NOT NULL,
    product_type VARCHAR(16) NOT NULL DEFAULT 'product',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_products_org_id UNIQUE (organization_id, id),
    CONSTRAINT fk_products_vat_rate FOREIGN KEY (organization_id, vat_rate_id)
        REFERENCES vat_rates(organization_id, id),
    CONSTRAINT chk_products_price CHECK (unit_price_cents >= 0),
    CONSTRAINT chk_products_type CHECK (product_type IN ('product', 'service'))
);

CREATE INDEX idx_products_org_name ON products(organization_id, name);
CREATE INDEX idx_products_vat_rate ON products(vat_rate_id);
CREATE UNIQUE INDEX uq_products_org_sku ON products(organization_id, sku) WHERE sku IS NOT NULL;
";

const MATERIALS_SQL: &str = r"
CREATE TABLE materials (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(200) NOT NULL,
    description TEXT,
    unit VARCHAR(32) NOT NULL DEFAULT 'pcs',
    unit_price_cents BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_materials_org_id UNIQUE (organization_id, id),
    CONSTRAINT chk_materials_price CHECK (unit_price_cents >= 0)
);

CREATE INDEX idx_materials_org_name ON materials(organization_id, name);
";

const PRODUCT_MATERIALS_SQL: &str = r"
CREATE TABLE product_materials (
    product_id UUID NOT NULL,
    material_id UUID NOT NULL,
    organization_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (product_id, material_id),
    CONSTRAINT fk_product_materials_product FOREIGN KEY (organization_id, product_id)
        REFERENCES products(organization_id, id) ON DELETE CASCADE,
    CONSTRAINT fk_product_materials_material FOREIGN KEY (organization_id, material_id)
        REFERENCES materials(organization_id, id) ON DELETE CASCADE
);

CREATE INDEX idx_product_materials_material ON product_materials(material_id);
";

const PRODUCT_ASSETS_SQL: &str = r"
CREATE TABLE product_assets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL,
    product_id UUID NOT NULL,
    asset_type VARCHAR(16) NOT NULL,
    file_key VARCHAR(1024),
    external_url VARCHAR(2048),
    file_name VARCHAR(255) NOT NULL,
    content_type VARCHAR(255),
    size_bytes BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT fk_product_assets_product FOREIGN KEY (organization_id, product_id)
        REFERENCES products(organization_id, id) ON DELETE CASCADE,
    CONSTRAINT chk_product_assets_source CHECK ((file_key IS NULL) <> (external_url IS NULL)),
    CONSTRAINT chk_product_assets_size CHECK (size_bytes IS NULL OR size_bytes > 0),
    CONSTRAINT chk_product_assets_type CHECK (
        asset_type IN ('image', 'document', 'video', 'audio', 'manual', 'other')
    )
);

CREATE INDEX idx_product_assets_product ON product_assets(organization_id, product_id, created_at DESC);
CREATE UNIQUE INDEX uq_product_assets_key ON product_assets(file_key) WHERE file_key IS NOT NULL;
";

const QUOTES_SQL: &str = r"
CREATE TABLE quotes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    quote_number VARCHAR(32) NOT NULL,
    customer_name VARCHAR(200) NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'draft',
    valid_until DATE,
    notes TEXT,
    subtotal_cents BIGINT NOT NULL DEFAULT 0,
    vat_cents BIGINT NOT NULL DEFAULT 0,
    total_cents BIGINT NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_quotes_org_number UNIQUE (organization_id, quote_number),
    CONSTRAINT uq_quotes_org_id UNIQUE (organization_id, id),
    CONSTRAINT chk_quotes_status CHECK (status IN ('draft', 'sent', 'accepted', 'rejected')),
    CONSTRAINT chk_quotes_total CHECK (total_cents = subtotal_cents + vat_cents)
);

CREATE INDEX idx_quotes_org_created ON quotes(organization_id, created_at DESC);
";

const QUOTE_LINES_SQL: &str = r"
CREATE TABLE quote_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    quote_id UUID NOT NULL,
    organization_id UUID NOT NULL,
    product_id UUID,
    description TEXT NOT NULL,
    quantity BIGINT NOT NULL,
    unit_price_cents BIGINT NOT NULL,
    vat_rate_bps INTEGER NOT NULL,
    position INTEGER NOT NULL,
    CONSTRAINT fk_quote_lines_quote FOREIGN KEY (organization_id, quote_id)
        REFERENCES quotes(organization_id, id) ON DELETE CASCADE,
    CONSTRAINT fk_quote_lines_product FOREIGN KEY (product_id)
        REFERENCES products(id) ON DELETE SET NULL,
    CONSTRAINT uq_quote_lines_position UNIQUE (quote_id, position),
    CONSTRAINT chk_quote_lines_quantity CHECK (quantity > 0),
    CONSTRAINT chk_quote_lines_price CHECK (unit_price_cents >= 0),
    CONSTRAINT chk_quote_lines_bps CHECK (vat_rate_bps BETWEEN 0 AND 10000)
);
";

const DROP_ALL_SQL: &str = r"
-- DROP ALL: Rollback migration
DROP TABLE IF EXISTS quote_lines CASCADE;
DROP TABLE IF EXISTS quotes CASCADE;
DROP TABLE IF EXISTS product_assets CASCADE;
DROP TABLE IF EXISTS product_materials CASCADE;
DROP TABLE IF EXISTS materials CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS vat_rates CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;
";
