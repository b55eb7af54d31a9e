//! Fixed support modules: `rpc.ts`, `rpc_client.ts` and `rpc_server.ts`.

use rpcgen_schema::Schema;

use crate::Code;
use crate::render::header_line;

const RPC_TS: &str = r#"
export const JSON_CONTENT_TYPE = 'application/json'
export const CBOR_CONTENT_TYPE = 'application/cbor'

/**
 * `blob` values: base64 text over JSON, raw bytes over CBOR. Blobs decoded
 * from JSON arrive as their base64 string.
 */
export type Bytes = Uint8Array | string

function toBase64(bytes: Uint8Array): string {
  let binary = ''
  for (const b of bytes) {
    binary += String.fromCharCode(b)
  }
  return btoa(binary)
}

/** JSON text with every `Uint8Array` spelled as base64. */
export function encodeJson(value: unknown): string {
  return JSON.stringify(value, (_key, v: unknown) => (v instanceof Uint8Array ? toBase64(v) : v))
}

/** Body of every failed call. */
export interface ErrorBody {
  code: number
  cause?: string
  msg: string
  error: string
}

export class RpcError extends Error {
  readonly code: number
  readonly error: string
  readonly causeText?: string

  constructor(code: number, error: string, msg: string, causeText?: string) {
    super(msg)
    this.name = 'RpcError'
    this.code = code
    this.error = error
    this.causeText = causeText
  }

  toBody(): ErrorBody {
    const body: ErrorBody = { code: this.code, msg: this.message, error: this.error }
    if (this.causeText !== undefined) {
      body.cause = this.causeText
    }
    return body
  }

  static fromBody(body: ErrorBody): RpcError {
    return new RpcError(body.code, body.error, body.msg, body.cause)
  }
}
"#;

const RPC_TS_JSON_CODEC: &str = r#"
export function encodeBody(contentType: string, value: unknown): Uint8Array | string {
  if (contentType !== JSON_CONTENT_TYPE) {
    throw new Error(`unsupported content type ${contentType}`)
  }
  return encodeJson(value)
}

export function decodeBody(contentType: string, bytes: Uint8Array): unknown {
  if (contentType !== JSON_CONTENT_TYPE) {
    throw new Error(`unsupported content type ${contentType}`)
  }
  return JSON.parse(new TextDecoder().decode(bytes))
}
"#;

const RPC_TS_CBOR_CODEC: &str = r#"
export function encodeBody(contentType: string, value: unknown): Uint8Array | string {
  if (contentType === CBOR_CONTENT_TYPE) {
    return encodeCbor(value)
  }
  return encodeJson(value)
}

export function decodeBody(contentType: string, bytes: Uint8Array): unknown {
  if (contentType === CBOR_CONTENT_TYPE) {
    return decodeCbor(bytes)
  }
  return JSON.parse(new TextDecoder().decode(bytes))
}
"#;

const RPC_CLIENT_TS: &str = r#"
import { type ErrorBody, RpcError, decodeBody, encodeBody } from './rpc'

export interface ClientOptions {
  baseUrl: string
  headers?: Record<string, string>
  fetch?: typeof fetch
}

export interface Route {
  method: 'GET' | 'POST'
  path: string
  requestType: string
  responseType: string
}

type QueryScalar = string | number | boolean
export type QueryValue = QueryScalar | readonly QueryScalar[] | undefined

/** Lists repeat the key; `undefined` is left out. */
export function appendQuery(query: URLSearchParams, key: string, value: QueryValue): void {
  if (value === undefined) {
    return
  }
  if (typeof value === 'object') {
    for (const item of value) {
      query.append(key, String(item))
    }
    return
  }
  query.append(key, String(value))
}

export async function rpcCall<T>(
  options: ClientOptions,
  route: Route,
  query?: URLSearchParams,
  params?: Record<string, unknown>,
): Promise<T> {
  let url = options.baseUrl.replace(/\/+$/, '') + route.path
  const search = query?.toString()
  if (search) {
    url += `?${search}`
  }

  const headers: Record<string, string> = { ...options.headers, Accept: route.responseType }
  let body: Uint8Array | string | undefined
  if (params !== undefined) {
    const present = Object.entries(params).filter(([, value]) => value !== undefined)
    headers['Content-Type'] = route.requestType
    body = encodeBody(route.requestType, Object.fromEntries(present))
  }

  const doFetch = options.fetch ?? fetch
  const res = await doFetch(url, { method: route.method, headers, body: body as BodyInit | undefined })
  const bytes = new Uint8Array(await res.arrayBuffer())

  if (!res.ok) {
    let payload: unknown
    try {
      payload = decodeBody(route.responseType, bytes)
    } catch {
      throw new RpcError(res.status, 'Error', res.statusText)
    }
    throw RpcError.fromBody(payload as ErrorBody)
  }
  return (decodeBody(route.responseType, bytes) as { data: T }).data
}
"#;

const RPC_SERVER_TS: &str = r#"
import express, { type Request, type RequestHandler, type Response } from 'express'

import { type ErrorBody, RpcError, decodeBody, encodeBody } from './rpc'

/** Passed to every handler method. */
export interface RpcContext {
  req: Request
  res: Response
}

export type Conv<T> = (raw: string) => T

class QueryError extends Error {}

/** Keeps request bodies as raw bytes for `readRequest`. */
export const rawBody: RequestHandler = express.raw({ type: () => true })

function queryValues(req: Request, key: string): string[] {
  const raw = req.query[key]
  if (raw === undefined) {
    return []
  }
  return (Array.isArray(raw) ? raw : [raw]).map(String)
}

function convert<T>(key: string, raw: string, conv: Conv<T>): T {
  try {
    return conv(raw)
  } catch (err) {
    const reason = err instanceof Error ? err.message : String(err)
    throw new QueryError(`query parameter '${key}': ${reason}`)
  }
}

export function queryOne<T>(req: Request, key: string, conv: Conv<T>): T {
  const values = queryValues(req, key)
  if (values.length === 0) {
    throw new QueryError(`missing query parameter '${key}'`)
  }
  if (values.length > 1) {
    throw new QueryError(`query parameter '${key}' given more than once`)
  }
  return convert(key, values[0], conv)
}

export function queryOpt<T>(req: Request, key: string, conv: Conv<T>): T | undefined {
  const values = queryValues(req, key)
  if (values.length > 1) {
    throw new QueryError(`query parameter '${key}' given more than once`)
  }
  return values.length === 0 ? undefined : convert(key, values[0], conv)
}

export function queryList<T>(req: Request, key: string, conv: Conv<T>): T[] {
  return queryValues(req, key).map((raw) => convert(key, raw, conv))
}

export const convBool: Conv<boolean> = (raw) => {
  if (raw === 'true') {
    return true
  }
  if (raw === 'false') {
    return false
  }
  throw new Error(`invalid bool '${raw}'`)
}

const INTEGER = /^(-?)(?:0[xX]([0-9a-fA-F]+)|([0-9]+))$/

/** Decimal or `0x` hex, range-checked against the declared width. */
export function convInt(bits: number, signed: boolean): Conv<number> {
  const width = BigInt(bits)
  const min = signed ? -(1n << (width - 1n)) : 0n
  const max = signed ? (1n << (width - 1n)) - 1n : (1n << width) - 1n
  return (raw) => {
    const m = INTEGER.exec(raw)
    if (m === null) {
      throw new Error(`invalid integer '${raw}'`)
    }
    let value = m[2] !== undefined ? BigInt(`0x${m[2]}`) : BigInt(m[3])
    if (m[1] === '-') {
      value = -value
    }
    if (value < min || value > max) {
      throw new Error(`${raw} is out of range for ${signed ? 'int' : 'uint'}${bits}`)
    }
    return Number(value)
  }
}

export const convFloat: Conv<number> = (raw) => {
  const value = Number(raw)
  if (raw.trim() === '' || Number.isNaN(value)) {
    throw new Error(`invalid number '${raw}'`)
  }
  return value
}

/** Unix seconds. */
export const convTimestamp: Conv<number> = convInt(64, true)

export const convString: Conv<string> = (raw) => raw

function send(res: Response, status: number, contentType: string, value: unknown): void {
  const payload = encodeBody(contentType, value)
  res
    .status(status)
    .type(contentType)
    .send(typeof payload === 'string' ? payload : Buffer.from(payload))
}

export function sendData(res: Response, status: number, contentType: string, data: unknown): void {
  send(res, status, contentType, { data: data ?? null })
}

export function sendError(
  res: Response,
  status: number,
  error: string,
  contentType: string,
  err: unknown,
): void {
  const body: ErrorBody =
    err instanceof RpcError
      ? { ...err.toBody(), code: status }
      : { code: status, msg: err instanceof Error ? err.message : String(err), error }
  send(res, status, contentType, body)
}

export function sendBadRequest(res: Response, contentType: string, err: unknown): void {
  const msg = err instanceof Error ? err.message : String(err)
  sendError(res, 400, 'BadRequest', contentType, new RpcError(400, 'BadRequest', msg))
}

/** Runs the query decoders; on failure answers 400 and returns `undefined`. */
export function decodeQuery<T>(res: Response, contentType: string, decode: () => T): T | undefined {
  try {
    return decode()
  } catch (err) {
    sendBadRequest(res, contentType, err)
    return undefined
  }
}

/** Decodes the params object; on failure answers 400 and returns `undefined`. */
export function readRequest(
  req: Request,
  res: Response,
  requestType: string,
  responseType: string,
): Record<string, unknown> | undefined {
  try {
    const raw: unknown = req.body
    const bytes = raw instanceof Uint8Array ? raw : new Uint8Array()
    const value = bytes.length === 0 ? {} : decodeBody(requestType, bytes)
    if (typeof value !== 'object' || value === null || Array.isArray(value)) {
      throw new Error('request body must be an object of named parameters')
    }
    return value as Record<string, unknown>
  } catch (err) {
    sendBadRequest(res, responseType, err)
    return undefined
  }
}
"#;

pub fn rpc(schemas: &[Schema]) -> Code {
    let cbor = schemas.iter().any(|s| s.has_cbor);
    let mut source = header_line("//", None);
    source.push('\n');
    if cbor {
        source.push_str("\nimport { decode as decodeCbor, encode as encodeCbor } from 'cbor-x'\n");
    }
    source.push_str(RPC_TS);
    source.push_str(if cbor { RPC_TS_CBOR_CODEC } else { RPC_TS_JSON_CODEC });
    Code {
        file_name: "rpc.ts".to_string(),
        source,
    }
}

pub fn client() -> Code {
    fixed("rpc_client.ts", RPC_CLIENT_TS)
}

pub fn server() -> Code {
    fixed("rpc_server.ts", RPC_SERVER_TS)
}

fn fixed(file_name: &str, body: &str) -> Code {
    Code {
        file_name: file_name.to_string(),
        source: format!("{}\n{body}", header_line("//", None)),
    }
}
