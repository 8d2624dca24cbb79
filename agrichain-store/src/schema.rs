//! PostgreSQL schema
//!
//! Embedded DDL executed by `PgStore::init_schema`. The `statuses` and
//! `event_types` taxonomy tables are seeded idempotently; ledger
//! operations resolve names through them and treat a missing required
//! name as a configuration error.

/// Complete AgriChain schema
pub const CHAIN_SCHEMA: &str = r#"
-- ============================================
-- Users
-- ============================================
CREATE TABLE IF NOT EXISTS users (
    user_id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    wallet_balance NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (wallet_balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- ============================================
-- Wallet ledger (append-only)
-- ============================================
CREATE TABLE IF NOT EXISTS wallet_entries (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(user_id),
    amount NUMERIC(14, 2) NOT NULL,
    reason TEXT NOT NULL,
    batch_id UUID,
    order_id UUID,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_wallet_entries_user ON wallet_entries(user_id);

-- ============================================
-- Products
-- ============================================
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    farmer_id UUID NOT NULL REFERENCES users(user_id),
    title TEXT NOT NULL,
    crop_details TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_products_farmer ON products(farmer_id);

-- ============================================
-- Taxonomy
-- ============================================
CREATE TABLE IF NOT EXISTS statuses (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS event_types (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- ============================================
-- Batches
-- ============================================
CREATE TABLE IF NOT EXISTS batches (
    id UUID PRIMARY KEY,
    batch_code TEXT NOT NULL UNIQUE,
    product_id UUID NOT NULL REFERENCES products(id),
    parent_batch_id UUID REFERENCES batches(id),
    current_owner_id UUID NOT NULL REFERENCES users(user_id),
    current_status_id INT NOT NULL REFERENCES statuses(id),
    initial_quantity NUMERIC(14, 3) NOT NULL CHECK (initial_quantity > 0),
    remaining_quantity NUMERIC(14, 3) NOT NULL
        CHECK (remaining_quantity >= 0 AND remaining_quantity <= initial_quantity),
    quantity_unit TEXT NOT NULL,
    price_per_unit NUMERIC(14, 2),
    final_price NUMERIC(14, 2),
    harvest_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_batches_product ON batches(product_id);
CREATE INDEX IF NOT EXISTS idx_batches_owner ON batches(current_owner_id);
CREATE INDEX IF NOT EXISTS idx_batches_parent ON batches(parent_batch_id);
CREATE INDEX IF NOT EXISTS idx_batches_status ON batches(current_status_id);

-- ============================================
-- Events (immutable)
-- ============================================
CREATE TABLE IF NOT EXISTS events (
    id UUID PRIMARY KEY,
    event_type_id INT NOT NULL REFERENCES event_types(id),
    batch_id UUID NOT NULL REFERENCES batches(id),
    actor_user_id UUID NOT NULL REFERENCES users(user_id),
    location_lat DOUBLE PRECISION,
    location_lon DOUBLE PRECISION,
    note TEXT,
    ledger_ref TEXT,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_events_batch ON events(batch_id);
CREATE INDEX IF NOT EXISTS idx_events_recorded ON events(recorded_at);

CREATE TABLE IF NOT EXISTS event_attachments (
    id UUID PRIMARY KEY,
    event_id UUID NOT NULL REFERENCES events(id),
    file_name TEXT NOT NULL,
    file_url TEXT,
    content_type TEXT,
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_attachments_event ON event_attachments(event_id);

CREATE TABLE IF NOT EXISTS device_raw_data (
    id UUID PRIMARY KEY,
    event_id UUID NOT NULL REFERENCES events(id),
    device_id TEXT NOT NULL,
    payload JSONB NOT NULL,
    captured_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_device_data_event ON device_raw_data(event_id);

-- ============================================
-- Product chain log (write-once acceleration rows)
-- ============================================
CREATE TABLE IF NOT EXISTS product_chain_logs (
    log_id UUID PRIMARY KEY,
    product_id UUID NOT NULL REFERENCES products(id),
    batch_id UUID NOT NULL REFERENCES batches(id),
    event_id UUID NOT NULL REFERENCES events(id),
    status_id INT NOT NULL REFERENCES statuses(id),
    logged_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_chain_logs_product ON product_chain_logs(product_id);

-- ============================================
-- Orders
-- ============================================
CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    order_number TEXT NOT NULL UNIQUE,
    buyer_id UUID NOT NULL REFERENCES users(user_id),
    seller_id UUID NOT NULL REFERENCES users(user_id),
    total_amount NUMERIC(14, 2) NOT NULL,
    is_completed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_orders_buyer ON orders(buyer_id);
CREATE INDEX IF NOT EXISTS idx_orders_seller ON orders(seller_id);

CREATE TABLE IF NOT EXISTS order_items (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id),
    batch_id UUID NOT NULL REFERENCES batches(id),
    quantity NUMERIC(14, 3) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
"#;

/// Idempotent taxonomy seed: one row per status and event type name
pub const TAXONOMY_SEED: &str = r#"
INSERT INTO statuses (name) VALUES
    ('Harvested'),
    ('Processing'),
    ('In Warehouse'),
    ('In Transit'),
    ('In Shop'),
    ('Sold')
ON CONFLICT (name) DO NOTHING;

INSERT INTO event_types (name) VALUES
    ('Harvest'),
    ('Harvest Log'),
    ('Fertilizer Applied'),
    ('Pesticide Applied'),
    ('Irrigation'),
    ('Quality Check'),
    ('Split'),
    ('Sold'),
    ('Transport Start'),
    ('Transport End'),
    ('Retail Sale')
ON CONFLICT (name) DO NOTHING;
"#;
